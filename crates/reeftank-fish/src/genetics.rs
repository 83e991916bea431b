//! Gene sets, inheritance and mutation
//!
//! Numeric genes live in `0..=9`, hue in `0..360`. Every function here returns
//! values inside those domains, so offspring can never drift out of range.

use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Highest value of a numeric gene
pub const GENE_MAX: u8 = 9;
/// Value used for numeric genes missing from older records
pub const DEFAULT_GENE: u8 = 5;
/// Number of distinct hues
pub const HUE_RANGE: u16 = 360;
/// Largest hue shift a single mutation can apply
const HUE_JITTER: i32 = 20;

/// Body pattern drawn on the fish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PatternType {
    #[default]
    Solid,
    Stripes,
    Spots,
    Gradient,
    Marble,
}

impl PatternType {
    pub const ALL: [PatternType; 5] = [
        PatternType::Solid,
        PatternType::Stripes,
        PatternType::Spots,
        PatternType::Gradient,
        PatternType::Marble,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Tail and fin silhouette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FinShape {
    #[default]
    Round,
    Fan,
    Pointed,
    Veil,
}

impl FinShape {
    pub const ALL: [FinShape; 4] = [
        FinShape::Round,
        FinShape::Fan,
        FinShape::Pointed,
        FinShape::Veil,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Eye style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EyeType {
    #[default]
    Dot,
    Round,
    Big,
    Sleepy,
}

impl EyeType {
    pub const ALL: [EyeType; 4] = [EyeType::Dot, EyeType::Round, EyeType::Big, EyeType::Sleepy];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Full heritable gene set of a fish
///
/// Missing fields in a deserialized record fall back to [`Genes::default`],
/// which uses the mid-range value for every numeric gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Genes {
    /// Cruise speed
    pub speed: u8,
    /// Sense radius, in steps of 20 px
    pub sense: u8,
    /// Widens food search and shortens the eat cooldown
    pub hunger_drive: u8,
    /// Raises offspring mutation chance and own shiny chance
    pub rarity: u8,
    /// Drives maximum lifespan
    pub constitution: u8,
    /// Body hue in degrees
    pub color_hue: u16,
    pub pattern: PatternType,
    pub fin: FinShape,
    pub eye: EyeType,
}

impl Default for Genes {
    fn default() -> Self {
        Self {
            speed: DEFAULT_GENE,
            sense: DEFAULT_GENE,
            hunger_drive: DEFAULT_GENE,
            rarity: DEFAULT_GENE,
            constitution: DEFAULT_GENE,
            color_hue: 180,
            pattern: PatternType::default(),
            fin: FinShape::default(),
            eye: EyeType::default(),
        }
    }
}

impl Genes {
    /// Draw a uniformly random gene set
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            speed: rng.random_range(0..=GENE_MAX),
            sense: rng.random_range(0..=GENE_MAX),
            hunger_drive: rng.random_range(0..=GENE_MAX),
            rarity: rng.random_range(0..=GENE_MAX),
            constitution: rng.random_range(0..=GENE_MAX),
            color_hue: rng.random_range(0..HUE_RANGE),
            pattern: PatternType::random(rng),
            fin: FinShape::random(rng),
            eye: EyeType::random(rng),
        }
    }

    /// Combine two parents into an offspring gene set
    ///
    /// Numeric genes inherit then mutate, hue inherits then mutates with
    /// wrap-around, appearance enums inherit only.
    pub fn inherit_from<R: Rng + ?Sized>(mother: &Genes, father: &Genes, rng: &mut R) -> Self {
        let chance = mutation_chance(mother, father);
        let numeric = |a: u8, b: u8, rng: &mut R| mutate_numeric(inherit(a, b, rng), chance, rng);

        let speed = numeric(mother.speed, father.speed, rng);
        let sense = numeric(mother.sense, father.sense, rng);
        let hunger_drive = numeric(mother.hunger_drive, father.hunger_drive, rng);
        let rarity = numeric(mother.rarity, father.rarity, rng);
        let constitution = numeric(mother.constitution, father.constitution, rng);
        let color_hue = mutate_hue(inherit(mother.color_hue, father.color_hue, rng), chance, rng);

        Self {
            speed,
            sense,
            hunger_drive,
            rarity,
            constitution,
            color_hue,
            pattern: inherit(mother.pattern, father.pattern, rng),
            fin: inherit(mother.fin, father.fin, rng),
            eye: inherit(mother.eye, father.eye, rng),
        }
    }

    /// Clamp every gene into its domain
    pub fn clamped(self) -> Self {
        Self {
            speed: self.speed.min(GENE_MAX),
            sense: self.sense.min(GENE_MAX),
            hunger_drive: self.hunger_drive.min(GENE_MAX),
            rarity: self.rarity.min(GENE_MAX),
            constitution: self.constitution.min(GENE_MAX),
            color_hue: self.color_hue % HUE_RANGE,
            ..self
        }
    }
}

/// Pick one parent's value with equal probability
pub fn inherit<T: Copy, R: Rng + ?Sized>(a: T, b: T, rng: &mut R) -> T {
    if rng.random_bool(0.5) { a } else { b }
}

/// With probability `chance`, step a numeric gene by exactly one in a random
/// direction. The result is clamped to `0..=9`.
pub fn mutate_numeric<R: Rng + ?Sized>(value: u8, chance: f32, rng: &mut R) -> u8 {
    let value = value.min(GENE_MAX);
    if rng.random::<f32>() >= chance {
        return value;
    }
    if rng.random_bool(0.5) {
        (value + 1).min(GENE_MAX)
    } else {
        value.saturating_sub(1)
    }
}

/// With probability `chance`, shift the hue by up to 20 degrees either way,
/// wrapping modulo 360.
pub fn mutate_hue<R: Rng + ?Sized>(hue: u16, chance: f32, rng: &mut R) -> u16 {
    let hue = hue % HUE_RANGE;
    if rng.random::<f32>() >= chance {
        return hue;
    }
    let shift = rng.random_range(-HUE_JITTER..=HUE_JITTER);
    // rem_euclid keeps the value in 0..360, which always fits u16
    (i32::from(hue) + shift).rem_euclid(i32::from(HUE_RANGE)) as u16
}

/// With probability `chance`, step a body size by one unit, clamped to `range`
pub fn mutate_size<R: Rng + ?Sized>(
    value: f32,
    chance: f32,
    range: RangeInclusive<f32>,
    rng: &mut R,
) -> f32 {
    let value = value.clamp(*range.start(), *range.end());
    if rng.random::<f32>() >= chance {
        return value;
    }
    let step = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    (value + step).clamp(*range.start(), *range.end())
}

/// Offspring mutation probability: rarer parents mutate more (0.0 to 0.09)
pub fn mutation_chance(a: &Genes, b: &Genes) -> f32 {
    f32::from(a.rarity.min(GENE_MAX) + b.rarity.min(GENE_MAX)) / 200.0
}

/// Roll the cosmetic shiny flag for a newborn
pub fn maybe_shiny<R: Rng + ?Sized>(rarity: u8, rng: &mut R) -> bool {
    rng.random::<f32>() < 0.02 + f32::from(rarity.min(GENE_MAX)) * 0.002
}
