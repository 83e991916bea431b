//! Fish entity and factory
//!
//! A fish is built either from random draws (population seeding) or from
//! inherited overrides (breeding output, loaded records). Derived fields such
//! as the lifespan and sense radius are computed here.

use std::f32::consts::PI;
use std::ops::RangeInclusive;

use glam::Vec2;
use rand::Rng;

use crate::behavior::BehaviorState;
use crate::genetics::{maybe_shiny, Genes};
use crate::movement::NewbornDrift;
use crate::types::{FishId, Sex};

/// Valid birth sizes after repair
pub const BIRTH_SIZE_RANGE: RangeInclusive<f32> = 4.0..=12.0;
/// Valid adult sizes after repair
pub const MAX_SIZE_RANGE: RangeInclusive<f32> = 14.0..=40.0;
/// Minimum gap between birth size and max size
pub const MIN_GROWTH_SPAN: f32 = 1.0;
/// Age after which a fish counts as an adult (seconds)
pub const ADULT_AGE: f32 = 240.0;
/// Sense radius per point of the sense gene (px)
pub const SENSE_RADIUS_PER_GENE: f32 = 20.0;
/// Extra food search radius per point of hunger drive (px)
pub const FOOD_RADIUS_PER_HUNGER: f32 = 10.0;

/// Field overrides for [`Fish::spawn`]. Anything left `None` is drawn randomly.
#[derive(Debug, Clone, Default)]
pub struct FishOverrides {
    pub genes: Option<Genes>,
    pub sex: Option<Sex>,
    pub birth_size: Option<f32>,
    pub max_size: Option<f32>,
    pub size: Option<f32>,
    pub position: Option<Vec2>,
    pub age: Option<f32>,
    pub max_age: Option<f32>,
    pub name: Option<String>,
    pub parents: Option<[FishId; 2]>,
    pub generation: Option<u32>,
    pub shiny: Option<bool>,
}

/// A single fish in the tank
#[derive(Debug, Clone)]
pub struct Fish {
    pub id: FishId,
    pub name: Option<String>,
    /// Ancestor IDs; the parents may be long gone
    pub parents: Option<[FishId; 2]>,
    pub generation: u32,

    pub genes: Genes,
    pub sex: Sex,

    pub birth_size: f32,
    pub max_size: f32,
    /// Body length in px, always within `birth_size..=max_size`
    pub size: f32,

    pub position: Vec2,
    pub velocity: Vec2,
    /// Unit facing vector
    pub heading: Vec2,

    /// Seconds alive
    pub age: f32,
    /// Age at which the fish dies unless it is a favorite
    pub max_age: f32,

    pub state: BehaviorState,
    /// Seconds until the fish may pair again
    pub breed_cooldown: f32,
    /// Age ran out during a ritual; die once it completes
    pub die_after_ritual: bool,

    /// Favorites never die of old age
    pub favorite: bool,
    pub shiny: bool,
    pub can_mate: bool,

    /// Seconds until the fish may eat again
    pub eat_cooldown: f32,
    /// Frozen-physics drift right after hatching
    pub newborn: Option<NewbornDrift>,

    pub wander_target: Option<Vec2>,
    pub wander_timer: f32,
}

impl Fish {
    /// Build a fish, drawing every field not present in `overrides`
    pub fn spawn<R: Rng + ?Sized>(overrides: FishOverrides, rng: &mut R) -> Self {
        let genes = overrides
            .genes
            .map(Genes::clamped)
            .unwrap_or_else(|| Genes::random(rng));
        let sex = overrides.sex.unwrap_or_else(|| Sex::random(rng));

        let max_size = overrides
            .max_size
            .unwrap_or_else(|| rng.random_range(22..=34) as f32);
        let birth_size = overrides
            .birth_size
            .unwrap_or_else(|| rng.random_range(6..=10) as f32);
        let (birth_size, max_size) = repair_sizes(birth_size, max_size);
        let size = overrides
            .size
            .unwrap_or(birth_size)
            .clamp(birth_size, max_size);

        let max_age = overrides
            .max_age
            .unwrap_or_else(|| roll_max_age(genes.constitution, rng));
        let shiny = overrides
            .shiny
            .unwrap_or_else(|| maybe_shiny(genes.rarity, rng));
        let heading = if rng.random_bool(0.5) { Vec2::X } else { Vec2::NEG_X };

        Self {
            id: FishId::next(),
            name: overrides.name,
            parents: overrides.parents,
            generation: overrides.generation.unwrap_or(0),
            genes,
            sex,
            birth_size,
            max_size,
            size,
            position: overrides.position.unwrap_or(Vec2::ZERO),
            velocity: Vec2::ZERO,
            heading,
            age: overrides.age.unwrap_or(0.0).max(0.0),
            max_age,
            state: BehaviorState::Wander,
            breed_cooldown: 0.0,
            die_after_ritual: false,
            favorite: false,
            shiny,
            can_mate: true,
            eat_cooldown: 0.0,
            newborn: None,
            wander_target: None,
            wander_timer: 0.0,
        }
    }

    /// Fully random fish at `position`
    pub fn random<R: Rng + ?Sized>(position: Vec2, rng: &mut R) -> Self {
        Self::spawn(
            FishOverrides {
                position: Some(position),
                ..Default::default()
            },
            rng,
        )
    }

    pub fn is_dead(&self) -> bool {
        matches!(self.state, BehaviorState::Dead(_))
    }

    pub fn is_adult(&self) -> bool {
        self.age >= ADULT_AGE && self.size >= self.max_size * 0.5
    }

    /// Detection range for food, corpses and mates
    pub fn sense_radius(&self) -> f32 {
        f32::from(self.genes.sense) * SENSE_RADIUS_PER_GENE
    }

    /// Food search range; zero while the fish is still digesting
    pub fn food_radius(&self) -> f32 {
        if self.eat_cooldown > 0.0 {
            0.0
        } else {
            self.sense_radius() + f32::from(self.genes.hunger_drive) * FOOD_RADIUS_PER_HUNGER
        }
    }

    /// Distance within which food is actually swallowed
    pub fn eat_reach(&self) -> f32 {
        (self.size * 0.85).max(12.0)
    }

    /// Cooldown after a meal, shorter for hungrier fish
    pub fn meal_cooldown(&self) -> f32 {
        (10.0 - f32::from(self.genes.hunger_drive)).clamp(1.0, 9.0)
    }

    /// Area of the body ellipse (length `size`, height `0.6 * size`)
    pub fn body_area(&self) -> f32 {
        PI * (self.size * 0.5) * (self.size * 0.3)
    }

    /// Grow by `amount`, never past `max_size`
    pub fn grow(&mut self, amount: f32) {
        self.size = (self.size + amount).clamp(self.birth_size, self.max_size);
    }

    /// Partner ID while in a ritual
    pub fn ritual_partner(&self) -> Option<FishId> {
        match self.state {
            BehaviorState::Ritual { partner, .. } => Some(partner),
            _ => None,
        }
    }

    /// Unpaired adult, alive, off cooldown and allowed to mate
    pub fn is_breed_ready(&self) -> bool {
        self.can_mate
            && self.newborn.is_none()
            && self.breed_cooldown <= 0.0
            && self.is_adult()
            && !matches!(
                self.state,
                BehaviorState::Dead(_) | BehaviorState::Ritual { .. }
            )
    }

    /// Advance age and countdown timers of a living fish
    pub fn tick_timers(&mut self, dt: f32) {
        self.age += dt;
        self.breed_cooldown = (self.breed_cooldown - dt).max(0.0);
        self.eat_cooldown = (self.eat_cooldown - dt).max(0.0);
    }
}

/// Lifespan from constitution: `60 + constitution * 120` seconds, +-30 s noise
pub fn roll_max_age<R: Rng + ?Sized>(constitution: u8, rng: &mut R) -> f32 {
    60.0 + f32::from(constitution) * 120.0 + rng.random_range(-30.0..=30.0)
}

/// Clamp sizes into range and keep birth size at least one unit below max size
pub fn repair_sizes(birth_size: f32, max_size: f32) -> (f32, f32) {
    let max_size = max_size.clamp(*MAX_SIZE_RANGE.start(), *MAX_SIZE_RANGE.end());
    let birth_size = birth_size
        .clamp(*BIRTH_SIZE_RANGE.start(), *BIRTH_SIZE_RANGE.end())
        .min(max_size - MIN_GROWTH_SPAN);
    (birth_size, max_size)
}
