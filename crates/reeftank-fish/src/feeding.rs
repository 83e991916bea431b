//! Feeding, growth and corpse erosion

use std::f32::consts::PI;

use glam::Vec2;

use crate::behavior::{is_edible_corpse, BehaviorState};
use crate::fish::Fish;
use crate::lifecycle::{BiteMark, BITE_RADIUS};
use crate::tank::Pellet;

/// Growth from one pellet (px)
pub const PELLET_GROWTH: f32 = 2.0;
/// Growth from one corpse bite (px)
pub const CORPSE_GROWTH: f32 = 1.0;
/// Minimum distance a fish flees after biting a corpse
pub const MIN_FLEE_DISTANCE: f32 = 30.0;

/// Alive, not busy and not digesting
pub fn can_eat(fish: &Fish) -> bool {
    fish.eat_cooldown <= 0.0
        && fish.newborn.is_none()
        && !matches!(
            fish.state,
            BehaviorState::Ritual { .. } | BehaviorState::Flee { .. } | BehaviorState::Dead(_)
        )
}

fn closest_within<I>(from: Vec2, reach: f32, candidates: I) -> Option<usize>
where
    I: Iterator<Item = (usize, Vec2)>,
{
    candidates
        .map(|(i, position)| (i, position.distance(from)))
        .filter(|(_, distance)| *distance <= reach)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}

/// Index of the closest pellet the fish can swallow right now
pub fn pellet_in_reach(fish: &Fish, pellets: &[Pellet]) -> Option<usize> {
    closest_within(
        fish.position,
        fish.eat_reach(),
        pellets.iter().map(|p| p.position).enumerate(),
    )
}

/// Index of the closest edible corpse the fish at `idx` can bite
pub fn corpse_in_reach(idx: usize, fishes: &[Fish]) -> Option<usize> {
    let me = fishes.get(idx)?;
    closest_within(
        me.position,
        me.eat_reach(),
        fishes
            .iter()
            .enumerate()
            .filter(|(j, f)| *j != idx && is_edible_corpse(f))
            .map(|(j, f)| (j, f.position)),
    )
}

/// Swallow a pellet: grow and start digesting
pub fn eat_pellet(fish: &mut Fish) {
    fish.grow(PELLET_GROWTH);
    fish.eat_cooldown = fish.meal_cooldown();
    fish.state = BehaviorState::Wander;
}

/// Take a bite out of `corpse`. The eater grows, starts digesting and flees
/// from the remains. Returns false if there was nothing to bite.
pub fn bite_corpse(eater: &mut Fish, corpse: &mut Fish) -> bool {
    let corpse_position = corpse.position;
    let corpse_size = corpse.size;
    let corpse_heading = corpse.heading;
    let BehaviorState::Dead(remains) = &mut corpse.state else {
        return false;
    };
    if remains.is_consumed() {
        return false;
    }

    let toward_eater = (eater.position - corpse_position)
        .try_normalize()
        .unwrap_or(corpse_heading);
    let offset = toward_eater * corpse_size * 0.4;
    remains.bites.push(BiteMark {
        local: Vec2::new(offset.dot(corpse_heading), offset.dot(corpse_heading.perp())),
        radius: BITE_RADIUS,
    });
    remains.area -= PI * BITE_RADIUS * BITE_RADIUS;

    eater.grow(CORPSE_GROWTH);
    eater.eat_cooldown = eater.meal_cooldown();
    eater.state = BehaviorState::Flee {
        from: corpse_position,
        remaining: MIN_FLEE_DISTANCE.max(eater.sense_radius() * 0.5),
    };
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fish::FishOverrides;
    use crate::lifecycle::{self, Corpse};
    use crate::types::PelletId;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    fn fish_at(x: f32, rng: &mut Xoshiro256StarStar) -> Fish {
        Fish::spawn(
            FishOverrides {
                position: Some(Vec2::new(x, 100.0)),
                birth_size: Some(8.0),
                max_size: Some(20.0),
                size: Some(10.0),
                ..Default::default()
            },
            rng,
        )
    }

    #[test]
    fn test_pellet_growth_and_cooldown() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(31);
        let mut fish = fish_at(100.0, &mut rng);
        fish.genes.hunger_drive = 5;
        eat_pellet(&mut fish);
        assert_eq!(fish.size, 12.0);
        assert_eq!(fish.eat_cooldown, 5.0);
        assert!(!can_eat(&fish));

        fish.size = 19.5;
        fish.eat_cooldown = 0.0;
        eat_pellet(&mut fish);
        assert_eq!(fish.size, 20.0);
    }

    #[test]
    fn test_reach_has_a_floor() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(32);
        let fish = fish_at(100.0, &mut rng);
        let pellets = vec![
            Pellet::new(PelletId(1), Vec2::new(125.0, 100.0)),
            Pellet::new(PelletId(2), Vec2::new(111.0, 100.0)),
        ];
        // size 10 gives 8.5, lifted to the 12 px minimum
        assert_eq!(pellet_in_reach(&fish, &pellets), Some(1));
        assert_eq!(pellet_in_reach(&fish, &pellets[..1]), None);
    }

    #[test]
    fn test_no_eating_while_fleeing_or_courting() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(33);
        let mut fish = fish_at(100.0, &mut rng);
        assert!(can_eat(&fish));
        fish.state = BehaviorState::Flee {
            from: Vec2::ZERO,
            remaining: 5.0,
        };
        assert!(!can_eat(&fish));
        fish.state = BehaviorState::Ritual {
            partner: fish.id,
            timer: 1.0,
            since_tick: 0,
        };
        assert!(!can_eat(&fish));
    }

    #[test]
    fn test_bite_erodes_corpse_and_triggers_flee() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(34);
        let mut eater = fish_at(100.0, &mut rng);
        eater.genes.sense = 8;
        eater.genes.hunger_drive = 5;
        let mut corpse = fish_at(108.0, &mut rng);
        lifecycle::die(&mut corpse);
        corpse.heading = Vec2::X;
        corpse.state = BehaviorState::Dead(Corpse::new(10.0));

        let fishes = vec![eater.clone(), corpse.clone()];
        assert_eq!(corpse_in_reach(0, &fishes), Some(1));

        assert!(bite_corpse(&mut eater, &mut corpse));
        let BehaviorState::Dead(remains) = &corpse.state else {
            panic!("corpse came back to life");
        };
        assert!((remains.area - (10.0 - PI * 9.0)).abs() < 1e-4);
        assert!(remains.is_consumed());
        assert_eq!(remains.bites.len(), 1);
        // Bite sits on the side facing the eater, behind the corpse's nose
        assert!((remains.bites[0].local - Vec2::new(-4.0, 0.0)).length() < 1e-4);

        assert_eq!(eater.size, 11.0);
        assert_eq!(eater.eat_cooldown, 5.0);
        assert_eq!(
            eater.state,
            BehaviorState::Flee {
                from: Vec2::new(108.0, 100.0),
                remaining: 80.0,
            }
        );

        // Nothing left to bite
        assert!(!bite_corpse(&mut eater, &mut corpse));
    }
}
