//! Behavior state machine and target selection
//!
//! Each tick a living fish is in exactly one [`BehaviorState`]. Fleeing and
//! ritual states are sticky and handled by their own modules; every other
//! state is re-decided from scratch by [`select_target`].

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::fish::Fish;
use crate::lifecycle::Corpse;
use crate::tank::{Pellet, TankBounds};
use crate::types::{FishId, PelletId};

/// Chance of choosing a visible mate over closer food
pub const MATE_IMPULSE: f64 = 0.3;
/// A mate wins outright when closer than this fraction of the food distance
pub const MATE_PREFERENCE: f32 = 0.8;
/// How far ahead a fleeing fish aims
const FLEE_LOOKAHEAD: f32 = 60.0;
/// Below this share of the lookahead the way out is blocked by a wall
const CORNERED_SHARE: f32 = 0.25;
/// Keep wander points this far from the walls
const WANDER_MARGIN: f32 = 30.0;
/// Re-pick the wander point when this close to it
const WANDER_ARRIVAL: f32 = 10.0;

/// Food a fish is heading for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FoodTarget {
    Pellet(PelletId),
    Corpse(FishId),
}

/// Mutually exclusive behavior states
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum BehaviorState {
    /// Idle cruising toward random points
    #[default]
    Wander,
    SeekFood(FoodTarget),
    SeekMate(FishId),
    /// Courtship with a mutually paired partner
    Ritual {
        partner: FishId,
        /// Seconds left until the litter hatches
        timer: f32,
        /// Tick the pair formed on; the timer holds during that tick
        #[serde(skip)]
        since_tick: u64,
    },
    /// Swimming away from `from` until `remaining` px are covered
    Flee { from: Vec2, remaining: f32 },
    /// Terminal state
    Dead(Corpse),
}

/// Data-free tag of a [`BehaviorState`], for snapshots and stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateTag {
    Wander,
    SeekFood,
    SeekMate,
    Ritual,
    Flee,
    Dead,
}

impl BehaviorState {
    pub fn tag(&self) -> StateTag {
        match self {
            Self::Wander => StateTag::Wander,
            Self::SeekFood(_) => StateTag::SeekFood,
            Self::SeekMate(_) => StateTag::SeekMate,
            Self::Ritual { .. } => StateTag::Ritual,
            Self::Flee { .. } => StateTag::Flee,
            Self::Dead(_) => StateTag::Dead,
        }
    }

    /// Still running away
    pub fn is_fleeing(&self) -> bool {
        matches!(self, Self::Flee { remaining, .. } if *remaining > 0.0)
    }
}

impl std::fmt::Display for StateTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wander => write!(f, "Wandering"),
            Self::SeekFood => write!(f, "Seeking food"),
            Self::SeekMate => write!(f, "Seeking mate"),
            Self::Ritual => write!(f, "Courting"),
            Self::Flee => write!(f, "Fleeing"),
            Self::Dead => write!(f, "Dead"),
        }
    }
}

/// Result of a decision: the new state and the point to steer toward
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub state: BehaviorState,
    pub target: Option<Vec2>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate<T> {
    key: T,
    position: Vec2,
    distance: f32,
}

fn nearest<T, I>(candidates: I) -> Option<Candidate<T>>
where
    I: Iterator<Item = Candidate<T>>,
{
    candidates.min_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

/// Pick the next state for the fish at `idx` from what it can sense.
///
/// Mates are only considered when `allow_mating` is set (population below its
/// limit). Returns `None` as target for `Wander`; the caller supplies a wander
/// point.
pub fn select_target<R: Rng + ?Sized>(
    idx: usize,
    fishes: &[Fish],
    pellets: &[Pellet],
    allow_mating: bool,
    rng: &mut R,
) -> Choice {
    let Some(me) = fishes.get(idx) else {
        return Choice {
            state: BehaviorState::Wander,
            target: None,
        };
    };
    let food_radius = me.food_radius();
    let sense_radius = me.sense_radius();

    let pellet = nearest(pellets.iter().filter_map(|p| {
        let distance = p.position.distance(me.position);
        (distance <= food_radius).then_some(Candidate {
            key: FoodTarget::Pellet(p.id),
            position: p.position,
            distance,
        })
    }));

    let corpse = nearest(
        fishes
            .iter()
            .enumerate()
            .filter(|(j, other)| *j != idx && is_edible_corpse(other))
            .filter_map(|(_, other)| {
                let distance = other.position.distance(me.position);
                (distance <= food_radius).then_some(Candidate {
                    key: FoodTarget::Corpse(other.id),
                    position: other.position,
                    distance,
                })
            }),
    );

    // Pellets win ties against corpses
    let food = match (pellet, corpse) {
        (Some(p), Some(c)) => Some(if p.distance <= c.distance { p } else { c }),
        (p, c) => p.or(c),
    };

    let mate = if allow_mating && me.is_breed_ready() {
        nearest(
            fishes
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != idx && is_compatible_mate(me, other))
                .filter_map(|(_, other)| {
                    let distance = other.position.distance(me.position);
                    (distance <= sense_radius).then_some(Candidate {
                        key: other.id,
                        position: other.position,
                        distance,
                    })
                }),
        )
    } else {
        None
    };

    let seek_mate = |m: Candidate<FishId>| Choice {
        state: BehaviorState::SeekMate(m.key),
        target: Some(m.position),
    };
    let seek_food = |f: Candidate<FoodTarget>| Choice {
        state: BehaviorState::SeekFood(f.key),
        target: Some(f.position),
    };

    match (mate, food) {
        (Some(m), Some(f)) => {
            if m.distance < f.distance * MATE_PREFERENCE || rng.random_bool(MATE_IMPULSE) {
                seek_mate(m)
            } else {
                seek_food(f)
            }
        }
        (Some(m), None) => seek_mate(m),
        (None, Some(f)) => seek_food(f),
        (None, None) => Choice {
            state: BehaviorState::Wander,
            target: None,
        },
    }
}

/// A dead fish that still has something left to eat
pub fn is_edible_corpse(fish: &Fish) -> bool {
    matches!(&fish.state, BehaviorState::Dead(corpse) if corpse.area > 0.0)
}

/// Breed-ready fish of the opposite sex
pub fn is_compatible_mate(me: &Fish, other: &Fish) -> bool {
    other.id != me.id && other.sex == me.sex.opposite() && other.is_breed_ready()
}

/// Point a fleeing fish steers toward: away from the threat, kept inside the
/// tank. A fish backed against a wall slides along it toward open water.
pub fn flee_target(fish: &Fish, from: Vec2, bounds: &TankBounds) -> Vec2 {
    let margin = fish.size * 0.5;
    let away = (fish.position - from).try_normalize().unwrap_or(fish.heading);
    let target = bounds.clamp_point(fish.position + away * FLEE_LOOKAHEAD, margin);
    if target.distance(fish.position) >= FLEE_LOOKAHEAD * CORNERED_SHARE {
        return target;
    }

    let side = away.perp();
    let side = if side.dot(bounds.center() - fish.position) >= 0.0 {
        side
    } else {
        -side
    };
    bounds.clamp_point(fish.position + side * FLEE_LOOKAHEAD, margin)
}

/// Advance the wander timer and return the current wander point, picking a
/// fresh one on arrival or after 3 to 8 seconds.
pub fn wander_target<R: Rng + ?Sized>(
    fish: &mut Fish,
    bounds: &TankBounds,
    dt: f32,
    rng: &mut R,
) -> Vec2 {
    fish.wander_timer -= dt;
    let arrived = fish
        .wander_target
        .is_some_and(|t| t.distance(fish.position) < WANDER_ARRIVAL);

    match fish.wander_target {
        Some(target) if !arrived && fish.wander_timer > 0.0 => target,
        _ => {
            let margin = WANDER_MARGIN.min(bounds.width * 0.5).min(bounds.height * 0.5);
            let target = Vec2::new(
                rng.random_range(margin..=bounds.width - margin),
                rng.random_range(margin..=bounds.height - margin),
            );
            fish.wander_target = Some(target);
            fish.wander_timer = rng.random_range(3.0..=8.0);
            target
        }
    }
}
