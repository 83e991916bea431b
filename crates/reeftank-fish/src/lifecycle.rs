//! Death, corpse decay and the discovery tracker

use ahash::HashSet;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::behavior::BehaviorState;
use crate::fish::Fish;
use crate::genetics::{FinShape, PatternType};

/// Upward drift of a corpse (px/s)
pub const CORPSE_FLOAT_SPEED: f32 = 12.0;
/// Radius of a single bite mark
pub const BITE_RADIUS: f32 = 3.0;

/// A bite taken out of a corpse, in the corpse's local frame
/// (`x` along the heading, `y` along its perpendicular).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiteMark {
    pub local: Vec2,
    pub radius: f32,
}

/// Remains of a dead fish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpse {
    /// Edible area left. Only ever decreases; may dip below zero on the last bite.
    pub area: f32,
    pub bites: Vec<BiteMark>,
    pub float_speed: f32,
}

impl Corpse {
    pub fn new(area: f32) -> Self {
        Self {
            area,
            bites: Vec::new(),
            float_speed: CORPSE_FLOAT_SPEED,
        }
    }

    pub fn is_consumed(&self) -> bool {
        self.area <= 0.0
    }
}

/// What the age check decided for a living fish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeOutcome {
    Alive,
    /// Died this tick
    Died,
    /// Out of time mid-ritual; dies when the ritual completes
    Deferred,
}

/// Kill a fish: snapshot its body area as the corpse and start floating up
pub fn die(fish: &mut Fish) {
    if fish.is_dead() {
        return;
    }
    let corpse = Corpse::new(fish.body_area());
    fish.velocity = Vec2::new(0.0, -corpse.float_speed);
    fish.state = BehaviorState::Dead(corpse);
    fish.die_after_ritual = false;
    fish.newborn = None;
    log::info!("{} died at age {:.0}s", fish.id, fish.age);
}

/// Old-age check. Favorites are exempt.
pub fn check_age(fish: &mut Fish) -> AgeOutcome {
    if fish.favorite || fish.is_dead() || fish.age < fish.max_age {
        return AgeOutcome::Alive;
    }
    if matches!(fish.state, BehaviorState::Ritual { .. }) {
        fish.die_after_ritual = true;
        return AgeOutcome::Deferred;
    }
    die(fish);
    AgeOutcome::Died
}

/// A corpse that is eaten away or has floated above the top of the tank
pub fn corpse_expired(fish: &Fish) -> bool {
    match &fish.state {
        BehaviorState::Dead(corpse) => corpse.is_consumed() || fish.position.y + fish.size < 0.0,
        _ => false,
    }
}

/// Float a corpse upward at its constant speed
pub fn float_corpse(fish: &mut Fish, dt: f32) {
    if let BehaviorState::Dead(corpse) = &fish.state {
        fish.velocity = Vec2::new(0.0, -corpse.float_speed);
        fish.position += fish.velocity * dt;
    }
}

/// Appearance combination seen in the tank
pub type DiscoveryKey = (PatternType, FinShape);

/// Insertion-only set of `(pattern, fin)` combinations ever seen,
/// iterated in discovery order.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryTracker {
    order: Vec<DiscoveryKey>,
    seen: HashSet<DiscoveryKey>,
}

impl DiscoveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys(keys: impl IntoIterator<Item = DiscoveryKey>) -> Self {
        let mut tracker = Self::new();
        for (pattern, fin) in keys {
            tracker.record(pattern, fin);
        }
        tracker
    }

    /// Returns true if the combination is new
    pub fn record(&mut self, pattern: PatternType, fin: FinShape) -> bool {
        let key = (pattern, fin);
        if !self.seen.insert(key) {
            return false;
        }
        self.order.push(key);
        true
    }

    pub fn contains(&self, pattern: PatternType, fin: FinShape) -> bool {
        self.seen.contains(&(pattern, fin))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn keys(&self) -> &[DiscoveryKey] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fish::FishOverrides;
    use crate::types::FishId;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    use std::f32::consts::PI;

    fn fish(size: f32) -> Fish {
        let mut rng = Xoshiro256StarStar::seed_from_u64(21);
        Fish::spawn(
            FishOverrides {
                birth_size: Some(8.0),
                max_size: Some(30.0),
                size: Some(size),
                position: Some(Vec2::new(100.0, 200.0)),
                max_age: Some(100.0),
                ..Default::default()
            },
            &mut rng,
        )
    }

    #[test]
    fn test_die_snapshots_body_area() {
        let mut f = fish(20.0);
        f.velocity = Vec2::new(30.0, 5.0);
        die(&mut f);
        let BehaviorState::Dead(corpse) = &f.state else {
            panic!("expected a corpse");
        };
        assert!((corpse.area - PI * 10.0 * 6.0).abs() < 1e-3);
        assert_eq!(f.velocity, Vec2::new(0.0, -CORPSE_FLOAT_SPEED));
    }

    #[test]
    fn test_age_death_and_favorites() {
        let mut f = fish(10.0);
        f.age = 100.0;
        f.favorite = true;
        assert_eq!(check_age(&mut f), AgeOutcome::Alive);
        assert!(!f.is_dead());

        f.favorite = false;
        assert_eq!(check_age(&mut f), AgeOutcome::Died);
        assert!(f.is_dead());
    }

    #[test]
    fn test_age_death_deferred_during_ritual() {
        let mut f = fish(10.0);
        f.age = 150.0;
        f.state = BehaviorState::Ritual {
            partner: FishId::restore(999_999).expect("non-zero"),
            timer: 10.0,
            since_tick: 0,
        };
        assert_eq!(check_age(&mut f), AgeOutcome::Deferred);
        assert!(f.die_after_ritual);
        assert!(!f.is_dead());
    }

    #[test]
    fn test_corpse_floats_and_leaves_tank() {
        let mut f = fish(10.0);
        die(&mut f);
        float_corpse(&mut f, 1.0);
        assert!((f.position.y - 188.0).abs() < 1e-4);
        assert!(!corpse_expired(&f));

        f.position.y = -10.5;
        assert!(corpse_expired(&f));
    }

    #[test]
    fn test_eaten_corpse_despawns() {
        let mut f = fish(10.0);
        die(&mut f);
        if let BehaviorState::Dead(corpse) = &mut f.state {
            corpse.area = -1.0;
        }
        assert!(corpse_expired(&f));
    }

    #[test]
    fn test_discovery_keeps_insertion_order() {
        let mut tracker = DiscoveryTracker::new();
        assert!(tracker.record(PatternType::Spots, FinShape::Veil));
        assert!(tracker.record(PatternType::Solid, FinShape::Round));
        assert!(!tracker.record(PatternType::Spots, FinShape::Veil));
        assert_eq!(
            tracker.keys(),
            &[
                (PatternType::Spots, FinShape::Veil),
                (PatternType::Solid, FinShape::Round)
            ]
        );
        assert!(tracker.contains(PatternType::Solid, FinShape::Round));
        assert!(!tracker.contains(PatternType::Marble, FinShape::Fan));
        assert_eq!(DiscoveryTracker::from_keys(tracker.keys().to_vec()).len(), 2);
    }
}
