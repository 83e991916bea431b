//! Breeding handshake and litter spawning
//!
//! Two breed-ready adults of opposite sex that come close enough are paired
//! into a mutual [`BehaviorState::Ritual`]. Both timers count down in
//! lockstep; when they run out the female spawns the litter and both parents
//! cool down. A pairing that loses its partner, stops being reciprocal or
//! drifts too far apart falls back to wandering.

use glam::Vec2;
use rand::Rng;

use crate::behavior::BehaviorState;
use crate::fish::{Fish, FishOverrides, BIRTH_SIZE_RANGE, MAX_SIZE_RANGE};
use crate::genetics::{inherit, mutate_size, mutation_chance, maybe_shiny, Genes};
use crate::movement::NewbornDrift;
use crate::types::{FishId, Sex};

/// Length of the courtship ritual (seconds)
pub const RITUAL_DURATION: f32 = 30.0;
/// Time before a parent may pair again (seconds)
pub const BREED_COOLDOWN: f32 = 60.0;
/// Fry per completed ritual
pub const LITTER_SIZE: usize = 3;
/// Coral this close to the parents' midpoint can make fry shiny
pub const CORAL_RANGE: f32 = 90.0;
/// Independent shiny chance per fry near coral
pub const CORAL_SHINY_CHANCE: f64 = 0.1;
/// Pairing range as a share of the pair's average sense radius
pub const PAIR_RANGE_FACTOR: f32 = 0.8;
/// Partners separated by more than this many body lengths break up
pub const RITUAL_LEASH: f32 = 3.0;

const DRIFT_MIN: f32 = 18.0;
const DRIFT_MAX: f32 = 32.0;

/// Outcome of validating an ongoing ritual
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RitualCheck {
    /// Pairing is broken. `release_partner` is set when the partner still
    /// points back and has to be reset as well.
    Abort { release_partner: bool },
    /// Keep courting; steer toward the partner
    Continue { partner_position: Vec2 },
    /// Timer ran out on the female side; spawn the litter
    Complete { partner: usize },
}

/// Largest distance at which two fish may still be paired
pub fn leash_length(a: &Fish, b: &Fish) -> f32 {
    RITUAL_LEASH * a.size.max(b.size)
}

fn points_back(partner: &Fish, me: FishId) -> bool {
    partner.ritual_partner() == Some(me)
}

/// Nearest partner close enough to start a ritual with the fish at `idx`
pub fn find_trigger_partner(idx: usize, fishes: &[Fish]) -> Option<usize> {
    let me = fishes.get(idx)?;
    if !me.is_breed_ready() {
        return None;
    }
    fishes
        .iter()
        .enumerate()
        .filter(|(j, other)| {
            *j != idx && other.sex == me.sex.opposite() && other.is_breed_ready()
        })
        .filter_map(|(j, other)| {
            let distance = me.position.distance(other.position);
            let range = PAIR_RANGE_FACTOR * (me.sense_radius() + other.sense_radius()) * 0.5;
            (distance <= range && distance <= leash_length(me, other)).then_some((j, distance))
        })
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(j, _)| j)
}

/// Put both fish into a mutual ritual. The timers hold during `tick`.
pub fn pair(a: &mut Fish, b: &mut Fish, tick: u64) {
    a.state = BehaviorState::Ritual {
        partner: b.id,
        timer: RITUAL_DURATION,
        since_tick: tick,
    };
    b.state = BehaviorState::Ritual {
        partner: a.id,
        timer: RITUAL_DURATION,
        since_tick: tick,
    };
    if let Some(facing) = (b.position - a.position).try_normalize() {
        a.heading = facing;
        b.heading = -facing;
    }
    log::debug!("{} and {} started courting", a.id, b.id);
}

/// Count the ritual timer down, except on the tick the pair formed
pub fn tick_ritual(fish: &mut Fish, tick: u64, dt: f32) {
    if let BehaviorState::Ritual {
        timer, since_tick, ..
    } = &mut fish.state
    {
        if *since_tick != tick {
            *timer -= dt;
        }
    }
}

/// Validate the ritual of the fish at `idx`
pub fn check_ritual(idx: usize, fishes: &[Fish]) -> RitualCheck {
    let Some(me) = fishes.get(idx) else {
        return RitualCheck::Abort {
            release_partner: false,
        };
    };
    let BehaviorState::Ritual { partner, timer, .. } = me.state else {
        return RitualCheck::Abort {
            release_partner: false,
        };
    };

    let Some((j, other)) = fishes
        .iter()
        .enumerate()
        .find(|(j, f)| *j != idx && f.id == partner)
    else {
        return RitualCheck::Abort {
            release_partner: false,
        };
    };

    if !points_back(other, me.id) || other.sex == me.sex {
        return RitualCheck::Abort {
            release_partner: false,
        };
    }
    if me.position.distance(other.position) > leash_length(me, other) {
        return RitualCheck::Abort {
            release_partner: true,
        };
    }
    if timer <= 0.0 && me.sex == Sex::Female {
        return RitualCheck::Complete { partner: j };
    }
    RitualCheck::Continue {
        partner_position: other.position,
    }
}

/// Return a fish from a ritual to idle wandering
pub fn abort_ritual(fish: &mut Fish) {
    if matches!(fish.state, BehaviorState::Ritual { .. }) {
        log::debug!("{} stopped courting", fish.id);
        fish.state = BehaviorState::Wander;
    }
}

/// Reset a parent after its ritual completed
pub fn finish_ritual(fish: &mut Fish) {
    fish.state = BehaviorState::Wander;
    fish.breed_cooldown = BREED_COOLDOWN;
}

/// Produce a litter of [`LITTER_SIZE`] fry behind the mother's tail.
///
/// `coral_nearby` gives each fry an extra, independent shiny roll.
pub fn breed<R: Rng + ?Sized>(
    mother: &Fish,
    father: &Fish,
    coral_nearby: bool,
    rng: &mut R,
) -> Vec<Fish> {
    let chance = mutation_chance(&mother.genes, &father.genes);
    let generation = mother.generation.max(father.generation) + 1;
    let tail = mother.position - mother.heading * mother.size * 0.6;
    let lateral = mother.heading.perp();

    (0..LITTER_SIZE)
        .map(|i| {
            let genes = Genes::inherit_from(&mother.genes, &father.genes, rng);
            let birth_size = mutate_size(
                inherit(mother.birth_size, father.birth_size, rng),
                chance,
                BIRTH_SIZE_RANGE,
                rng,
            );
            let max_size = mutate_size(
                inherit(mother.max_size, father.max_size, rng),
                chance,
                MAX_SIZE_RANGE,
                rng,
            );
            let shiny = maybe_shiny(genes.rarity, rng)
                || (coral_nearby && rng.random_bool(CORAL_SHINY_CHANCE));

            // Fan the fry out: left, centre, right
            let spread = i as f32 - (LITTER_SIZE as f32 - 1.0) * 0.5;
            let origin = tail + lateral * spread * mother.size * 0.5;
            let away = (-mother.heading + lateral * spread * 0.5)
                .try_normalize()
                .unwrap_or(-mother.heading);
            let destination = origin + away * rng.random_range(DRIFT_MIN..=DRIFT_MAX);

            let mut fry = Fish::spawn(
                FishOverrides {
                    genes: Some(genes),
                    birth_size: Some(birth_size),
                    max_size: Some(max_size),
                    position: Some(origin),
                    parents: Some([mother.id, father.id]),
                    generation: Some(generation),
                    shiny: Some(shiny),
                    ..Default::default()
                },
                rng,
            );
            fry.newborn = Some(NewbornDrift::new(origin, destination));
            fry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fish::ADULT_AGE;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    fn adult(sex: Sex, x: f32, rng: &mut Xoshiro256StarStar) -> Fish {
        let mut fish = Fish::spawn(
            FishOverrides {
                sex: Some(sex),
                position: Some(Vec2::new(x, 100.0)),
                birth_size: Some(8.0),
                max_size: Some(24.0),
                size: Some(20.0),
                age: Some(ADULT_AGE + 1.0),
                max_age: Some(10_000.0),
                ..Default::default()
            },
            rng,
        );
        fish.genes.sense = 9;
        fish
    }

    #[test]
    fn test_trigger_requires_range_and_readiness() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(5);
        let fishes = vec![
            adult(Sex::Male, 100.0, &mut rng),
            adult(Sex::Female, 110.0, &mut rng),
            adult(Sex::Male, 105.0, &mut rng),
        ];
        assert_eq!(find_trigger_partner(0, &fishes), Some(1));
        assert_eq!(find_trigger_partner(1, &fishes), Some(2));

        let mut tired = fishes.clone();
        tired[1].breed_cooldown = 5.0;
        assert_eq!(find_trigger_partner(0, &tired), None);

        let mut far = fishes;
        far[1].position.x = 300.0;
        assert_eq!(find_trigger_partner(0, &far), None);
    }

    #[test]
    fn test_pair_is_mutual() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(6);
        let mut a = adult(Sex::Male, 100.0, &mut rng);
        let mut b = adult(Sex::Female, 110.0, &mut rng);
        pair(&mut a, &mut b, 7);
        assert_eq!(a.ritual_partner(), Some(b.id));
        assert_eq!(b.ritual_partner(), Some(a.id));
        assert_eq!(a.heading, Vec2::X);
        assert_eq!(b.heading, Vec2::NEG_X);

        tick_ritual(&mut a, 7, 1.0);
        tick_ritual(&mut b, 8, 1.0);
        assert!(matches!(a.state, BehaviorState::Ritual { timer, .. } if timer == RITUAL_DURATION));
        assert!(matches!(b.state, BehaviorState::Ritual { timer, .. } if timer == RITUAL_DURATION - 1.0));
    }

    #[test]
    fn test_check_ritual_outcomes() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(7);
        let mut a = adult(Sex::Male, 100.0, &mut rng);
        let mut b = adult(Sex::Female, 110.0, &mut rng);
        pair(&mut a, &mut b, 0);
        let mut fishes = vec![a, b];

        assert!(matches!(check_ritual(0, &fishes), RitualCheck::Continue { .. }));

        for fish in &mut fishes {
            tick_ritual(fish, 1, RITUAL_DURATION);
        }
        // The male holds, the female completes
        assert!(matches!(check_ritual(0, &fishes), RitualCheck::Continue { .. }));
        assert_eq!(check_ritual(1, &fishes), RitualCheck::Complete { partner: 0 });

        fishes[1].position.x = 100.0 + leash_length(&fishes[0], &fishes[1]) + 1.0;
        assert_eq!(
            check_ritual(0, &fishes),
            RitualCheck::Abort {
                release_partner: true
            }
        );
    }

    #[test]
    fn test_dangling_pairing_self_heals() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(8);
        let mut a = adult(Sex::Male, 100.0, &mut rng);
        let mut b = adult(Sex::Female, 110.0, &mut rng);
        pair(&mut a, &mut b, 0);
        b.state = BehaviorState::Wander;
        let fishes = vec![a.clone(), b];
        assert_eq!(
            check_ritual(0, &fishes),
            RitualCheck::Abort {
                release_partner: false
            }
        );
        // Partner removed entirely
        assert_eq!(
            check_ritual(0, &[a]),
            RitualCheck::Abort {
                release_partner: false
            }
        );
    }

    #[test]
    fn test_breed_litter() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(9);
        let mut mother = adult(Sex::Female, 200.0, &mut rng);
        let father = adult(Sex::Male, 220.0, &mut rng);
        mother.generation = 2;
        let fry = breed(&mother, &father, false, &mut rng);
        assert_eq!(fry.len(), LITTER_SIZE);

        for child in &fry {
            assert_eq!(child.parents, Some([mother.id, father.id]));
            assert_eq!(child.generation, 3);
            assert!(child.birth_size < child.max_size);
            assert_eq!(child.size, child.birth_size);
            assert_eq!(child.age, 0.0);
            let drift = child.newborn.expect("fry start drifting");
            let travel = drift.origin.distance(drift.destination);
            assert!((DRIFT_MIN..=DRIFT_MAX + 1e-3).contains(&travel));
        }
        // Each fry starts from its own lateral offset
        assert_ne!(fry[0].position, fry[1].position);
        assert_ne!(fry[1].position, fry[2].position);
    }

    #[test]
    fn test_coral_raises_shiny_rate() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(10);
        let mut mother = adult(Sex::Female, 200.0, &mut rng);
        let mut father = adult(Sex::Male, 220.0, &mut rng);
        mother.genes.rarity = 0;
        father.genes.rarity = 0;

        let count = |coral: bool, rng: &mut Xoshiro256StarStar| {
            (0..400)
                .flat_map(|_| breed(&mother, &father, coral, rng))
                .filter(|f| f.shiny)
                .count()
        };
        let plain = count(false, &mut rng);
        let coral = count(true, &mut rng);
        assert!(coral > plain, "coral {coral} vs plain {plain}");
    }
}
