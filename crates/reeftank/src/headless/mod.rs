//! Headless tank runs
//!
//! This module drives the fish core without a window:
//! - Tank setup from configuration (scenery, seeded or loaded population)
//! - A fixed-timestep loop with an automatic feeder
//! - Periodic population samples and a final summary
//! - RON export of the surviving population

mod export;
mod runner;

pub use export::{read_records, write_records, write_summary};
pub use runner::{PopulationSample, RunSummary, TankRunner};
