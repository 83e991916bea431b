//! Common identifier types for fish and tank objects

use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hatch number of a fish. Numbers start at 1, are never reused within a
/// process and survive a save/load round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FishId(NonZeroU64);

/// Next hatch number to hand out
static HATCH_COUNTER: AtomicU64 = AtomicU64::new(1);

impl FishId {
    /// Allocate the next hatch number
    pub fn next() -> Self {
        let n = HATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(n).unwrap_or(NonZeroU64::MIN))
    }

    /// Take over a hatch number from a saved record. Zero is not a valid
    /// number. Later hatchlings are numbered past every restored one.
    pub fn restore(n: u64) -> Option<Self> {
        let n = NonZeroU64::new(n)?;
        HATCH_COUNTER.fetch_max(n.get().saturating_add(1), Ordering::Relaxed);
        Some(Self(n))
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl From<FishId> for u64 {
    fn from(id: FishId) -> Self {
        id.get()
    }
}

impl std::fmt::Display for FishId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fish #{}", self.0)
    }
}

/// Identifier for a food pellet, allocated by the owning world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PelletId(pub u64);

impl std::fmt::Display for PelletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pellet({})", self.0)
    }
}

/// Biological sex of a fish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Draw a sex with equal probability
    pub fn random<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    /// The other sex
    pub fn opposite(self) -> Self {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hatch_numbers_increase() {
        let a = FishId::next();
        let b = FishId::next();
        assert!(b.get() > a.get());
        assert_eq!(u64::from(b), b.get());
    }

    #[test]
    fn test_restored_numbers_are_not_handed_out_again() {
        let restored = FishId::restore(1_000_000).expect("non-zero");
        assert_eq!(restored.get(), 1_000_000);
        assert!(FishId::next() > restored);
    }

    #[test]
    fn test_zero_is_not_a_hatch_number() {
        assert_eq!(FishId::restore(0), None);
    }

    #[test]
    fn test_sex_opposite() {
        assert_eq!(Sex::Male.opposite(), Sex::Female);
        assert_eq!(Sex::Female.opposite(), Sex::Male);
    }
}
