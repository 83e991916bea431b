//! Fish lifecycle and behavior core for Reeftank
//!
//! This crate implements:
//! - Gene inheritance with small mutations and cosmetic shiny rolls
//! - A per-fish behavior state machine (wander, food, mates, courtship, flight)
//! - A two-sided breeding ritual that hatches litters of fry
//! - Aging, death and corpses that erode as other fish bite them
//! - A [`World`] that owns the tank and advances it one tick at a time

pub mod behavior;
pub mod breeding;
pub mod error;
pub mod feeding;
pub mod fish;
pub mod genetics;
pub mod lifecycle;
pub mod movement;
pub mod snapshot;
pub mod tank;
pub mod traits;
pub mod types;
pub mod world;

// Re-export main types for convenience
pub use behavior::{BehaviorState, FoodTarget, StateTag};
pub use error::WorldError;
pub use fish::{Fish, FishOverrides};
pub use genetics::{EyeType, FinShape, Genes, PatternType};
pub use lifecycle::{BiteMark, Corpse, DiscoveryTracker};
pub use snapshot::{FishRecord, FishSnapshot};
pub use tank::{DecorKind, Decoration, Pellet, TankBounds};
pub use traits::{LogEvents, NoEvents, TankEvents};
pub use types::{FishId, PelletId, Sex};
pub use world::{TankSettings, World, WorldStats};
