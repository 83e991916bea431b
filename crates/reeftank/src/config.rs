//! Runner configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `reeftank.ron` file (if exists), or an explicit file passed on the CLI
//! 3. Environment variables prefixed with `REEFTANK_`
//!
//! Example environment variable: `REEFTANK_TANK__MAX_POPULATION=40`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use reeftank_fish::TankSettings;
use serde::{Deserialize, Serialize};

/// Main runner configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunnerConfig {
    #[serde(default)]
    pub tank: TankConfig,

    #[serde(default)]
    pub population: PopulationConfig,

    #[serde(default)]
    pub feeding: FeedingConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Tank size and scenery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TankConfig {
    pub width: f32,
    pub height: f32,
    /// Breeding stops at this many fish
    pub max_population: usize,
    /// Plants scattered along the floor
    pub plants: usize,
    pub rocks: usize,
    pub corals: usize,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 540.0,
            max_population: 30,
            plants: 3,
            rocks: 2,
            corals: 1,
        }
    }
}

impl TankConfig {
    pub fn settings(&self) -> TankSettings {
        TankSettings {
            width: self.width,
            height: self.height,
            max_population: self.max_population,
        }
    }
}

/// Starting population
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Random fish added at startup
    pub initial: usize,
    /// RON file of fish records to start from instead
    pub load_path: Option<PathBuf>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial: 12,
            load_path: None,
        }
    }
}

/// Automatic feeder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedingConfig {
    /// Seconds between feedings, 0 disables the feeder
    pub interval_secs: f32,
    pub pellets_per_drop: usize,
}

impl Default for FeedingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 8.0,
            pellets_per_drop: 4,
        }
    }
}

/// Simulation timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Simulated seconds to run
    pub duration_secs: f32,
    /// Fixed timestep in seconds
    pub dt: f32,
    /// Seconds between population log lines
    pub stats_interval_secs: f32,
    /// RNG seed; drawn at random when unset
    pub seed: Option<u64>,
    /// Show a progress bar
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration_secs: 600.0,
            dt: 1.0 / 60.0,
            stats_interval_secs: 30.0,
            seed: None,
            progress: true,
        }
    }
}

/// Where to write results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Final population as RON fish records
    pub records_path: Option<PathBuf>,
    /// Run summary as RON
    pub summary_path: Option<PathBuf>,
}

impl RunnerConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `reeftank.ron` file (if exists)
    /// 3. Environment variables prefixed with `REEFTANK_` (highest priority)
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Same as [`RunnerConfig::load`], reading `path` instead of
    /// `reeftank.ron`. An explicit file must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path.to_path_buf())
                .format(FileFormat::Ron)
                .required(true),
            None => File::with_name("reeftank")
                .format(FileFormat::Ron)
                .required(false),
        };

        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("tank.width", 960.0)?
            .set_default("tank.height", 540.0)?
            .set_default("tank.max_population", 30_i64)?
            .set_default("tank.plants", 3_i64)?
            .set_default("tank.rocks", 2_i64)?
            .set_default("tank.corals", 1_i64)?
            .set_default("population.initial", 12_i64)?
            .set_default("feeding.interval_secs", 8.0)?
            .set_default("feeding.pellets_per_drop", 4_i64)?
            .set_default("run.duration_secs", 600.0)?
            .set_default("run.dt", 1.0 / 60.0)?
            .set_default("run.stats_interval_secs", 30.0)?
            .set_default("run.progress", true)?
            // Layer 2: Config file
            .add_source(file)
            // Layer 3: Environment variables (REEFTANK_RUN__SEED, etc.)
            .add_source(
                Environment::with_prefix("REEFTANK")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert_eq!(config.tank.width, 960.0);
        assert_eq!(config.tank.max_population, 30);
        assert_eq!(config.feeding.pellets_per_drop, 4);
        assert!(config.run.seed.is_none());
        assert!(config.output.records_path.is_none());
    }

    #[test]
    fn test_load_config_with_defaults() {
        // Should load defaults when no config file exists
        let config = RunnerConfig::load().expect("Failed to load config");
        assert_eq!(config.tank.height, 540.0);
        assert_eq!(config.population.initial, 12);
        assert!(config.run.progress);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".ron")
            .tempfile()
            .expect("Failed to create temp file");
        write!(
            file,
            "(tank: (width: 400.0, max_population: 12), run: (seed: 7, duration_secs: 5.0))"
        )
        .expect("Failed to write config");

        let config = RunnerConfig::load_from(Some(file.path())).expect("Failed to load config");
        assert_eq!(config.tank.width, 400.0);
        assert_eq!(config.tank.max_population, 12);
        assert_eq!(config.tank.height, 540.0);
        assert_eq!(config.run.seed, Some(7));
        assert_eq!(config.run.duration_secs, 5.0);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let missing = dir.path().join("nope.ron");
        assert!(RunnerConfig::load_from(Some(&missing)).is_err());
    }

    #[test]
    fn test_tank_settings() {
        let tank = TankConfig {
            width: 300.0,
            height: 200.0,
            max_population: 5,
            ..TankConfig::default()
        };
        let settings = tank.settings();
        assert_eq!(settings.width, 300.0);
        assert_eq!(settings.max_population, 5);
    }
}
