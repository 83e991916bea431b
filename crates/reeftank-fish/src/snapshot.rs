//! Read-only fish views and serializable fish records
//!
//! [`FishSnapshot`] is what a renderer needs to draw a fish without touching
//! the simulation. [`FishRecord`] is the persistence format: every field of a
//! fish, with defaults for anything an older save left out.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::behavior::{BehaviorState, StateTag};
use crate::fish::{roll_max_age, Fish, FishOverrides};
use crate::genetics::Genes;
use crate::lifecycle::BiteMark;
use crate::movement::NewbornDrift;
use crate::types::{FishId, Sex};

/// Birth size assumed for records that predate size genetics
pub const LEGACY_BIRTH_SIZE: f32 = 8.0;
/// Max size assumed for records that predate size genetics
pub const LEGACY_MAX_SIZE: f32 = 28.0;

/// Everything needed to draw one fish
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FishSnapshot {
    pub id: FishId,
    pub name: Option<String>,
    pub position: Vec2,
    pub heading: Vec2,
    pub size: f32,
    pub sex: Sex,
    pub genes: Genes,
    pub state: StateTag,
    pub dead: bool,
    /// Bite marks to punch out of the body, empty while alive
    pub bites: Vec<BiteMark>,
    pub shiny: bool,
    pub favorite: bool,
}

impl From<&Fish> for FishSnapshot {
    fn from(fish: &Fish) -> Self {
        let bites = match &fish.state {
            BehaviorState::Dead(corpse) => corpse.bites.clone(),
            _ => Vec::new(),
        };
        Self {
            id: fish.id,
            name: fish.name.clone(),
            position: fish.position,
            heading: fish.heading,
            size: fish.size,
            sex: fish.sex,
            genes: fish.genes,
            state: fish.state.tag(),
            dead: fish.is_dead(),
            bites,
            shiny: fish.shiny,
            favorite: fish.favorite,
        }
    }
}

/// Persisted form of a fish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FishRecord {
    /// Raw fish id; a fresh one is assigned when absent
    pub id: Option<u64>,
    pub name: Option<String>,
    pub parents: Option<[u64; 2]>,
    pub generation: u32,
    pub genes: Genes,
    pub sex: Option<Sex>,
    pub birth_size: Option<f32>,
    pub max_size: Option<f32>,
    pub size: Option<f32>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub heading: Vec2,
    pub age: f32,
    /// Re-derived from constitution when absent
    pub max_age: Option<f32>,
    pub state: BehaviorState,
    pub breed_cooldown: f32,
    pub die_after_ritual: bool,
    pub favorite: bool,
    pub shiny: bool,
    pub can_mate: bool,
    pub eat_cooldown: f32,
    pub newborn: Option<NewbornDrift>,
}

impl Default for FishRecord {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            parents: None,
            generation: 0,
            genes: Genes::default(),
            sex: None,
            birth_size: None,
            max_size: None,
            size: None,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            heading: Vec2::X,
            age: 0.0,
            max_age: None,
            state: BehaviorState::Wander,
            breed_cooldown: 0.0,
            die_after_ritual: false,
            favorite: false,
            shiny: false,
            can_mate: true,
            eat_cooldown: 0.0,
            newborn: None,
        }
    }
}

impl From<&Fish> for FishRecord {
    fn from(fish: &Fish) -> Self {
        Self {
            id: Some(fish.id.get()),
            name: fish.name.clone(),
            parents: fish.parents.map(|[a, b]| [a.get(), b.get()]),
            generation: fish.generation,
            genes: fish.genes,
            sex: Some(fish.sex),
            birth_size: Some(fish.birth_size),
            max_size: Some(fish.max_size),
            size: Some(fish.size),
            position: fish.position,
            velocity: fish.velocity,
            heading: fish.heading,
            age: fish.age,
            max_age: Some(fish.max_age),
            state: fish.state.clone(),
            breed_cooldown: fish.breed_cooldown,
            die_after_ritual: fish.die_after_ritual,
            favorite: fish.favorite,
            shiny: fish.shiny,
            can_mate: fish.can_mate,
            eat_cooldown: fish.eat_cooldown,
            newborn: fish.newborn,
        }
    }
}

impl FishRecord {
    /// Rebuild a fish, filling legacy gaps and clamping values into range.
    /// `rng` is only consulted for fields the record does not carry.
    pub fn into_fish<R: Rng + ?Sized>(self, rng: &mut R) -> Fish {
        let genes = self.genes.clamped();
        let max_age = self
            .max_age
            .filter(|age| age.is_finite() && *age > 0.0)
            .unwrap_or_else(|| roll_max_age(genes.constitution, rng));

        let mut fish = Fish::spawn(
            FishOverrides {
                genes: Some(genes),
                sex: self.sex,
                birth_size: Some(self.birth_size.unwrap_or(LEGACY_BIRTH_SIZE)),
                max_size: Some(self.max_size.unwrap_or(LEGACY_MAX_SIZE)),
                size: self.size,
                position: Some(self.position),
                age: Some(self.age),
                max_age: Some(max_age),
                name: self.name,
                parents: self
                    .parents
                    .and_then(|[a, b]| Some([FishId::restore(a)?, FishId::restore(b)?])),
                generation: Some(self.generation),
                shiny: Some(self.shiny),
            },
            rng,
        );

        if let Some(id) = self.id.and_then(FishId::restore) {
            fish.id = id;
        }
        fish.velocity = self.velocity;
        fish.heading = self.heading.try_normalize().unwrap_or(fish.heading);
        fish.state = self.state;
        fish.breed_cooldown = self.breed_cooldown.max(0.0);
        fish.die_after_ritual = self.die_after_ritual;
        fish.favorite = self.favorite;
        fish.can_mate = self.can_mate;
        fish.eat_cooldown = self.eat_cooldown.max(0.0);
        fish.newborn = self.newborn;
        fish
    }
}
