//! Headless runner for the Reeftank fish simulation
//!
//! Loads layered configuration, builds a tank and advances it with a fixed
//! timestep, logging population samples and optionally exporting the final
//! population as RON fish records.

pub mod config;
pub mod headless;

pub use config::RunnerConfig;
pub use headless::{RunSummary, TankRunner};
