//! Error types for tank operations.

use crate::types::FishId;

/// Errors returned by fallible [`crate::World`] operations.
///
/// The per-tick update never fails; these only come from explicit
/// population management calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// No fish with this id lives in the tank.
    #[error("{0} is not in the tank")]
    UnknownFish(FishId),

    /// The tank already holds its maximum population.
    #[error("tank is full ({limit} fish)")]
    PopulationFull { limit: usize },
}
