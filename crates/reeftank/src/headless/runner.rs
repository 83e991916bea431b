//! Fixed-timestep tank runner

use anyhow::{Context, Result};
use glam::Vec2;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use reeftank_fish::{
    BehaviorState, DecorKind, Decoration, FinShape, PatternType, TankEvents, World, WorldStats,
};
use serde::{Deserialize, Serialize};

use super::export;
use crate::config::RunnerConfig;

/// Scenery radius range (px)
const DECOR_RADIUS: std::ops::RangeInclusive<f32> = 18.0..=36.0;
/// Keeps the feeder RNG stream apart from the world's
const FEEDER_SEED_SALT: u64 = 0x5eed_f00d;

/// Population counts at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationSample {
    pub time_secs: f32,
    pub living: usize,
    pub corpses: usize,
    pub courting: usize,
    pub pellets: usize,
}

impl PopulationSample {
    fn take(world: &World, time_secs: f32) -> Self {
        let mut sample = Self {
            time_secs,
            living: 0,
            corpses: 0,
            courting: 0,
            pellets: world.pellets().len(),
        };
        for fish in world.fish() {
            match fish.state {
                BehaviorState::Dead(_) => sample.corpses += 1,
                BehaviorState::Ritual { .. } => {
                    sample.living += 1;
                    sample.courting += 1;
                }
                _ => sample.living += 1,
            }
        }
        sample
    }
}

/// Result of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub ticks: u64,
    pub simulated_secs: f32,
    pub stats: WorldStats,
    pub discoveries: Vec<(PatternType, FinShape)>,
    pub history: Vec<PopulationSample>,
    pub final_sample: PopulationSample,
}

/// Sends toasts through the progress bar so they don't tear it
struct ProgressEvents {
    progress: ProgressBar,
}

impl TankEvents for ProgressEvents {
    fn generation_advanced(&mut self) {
        log::debug!("Generation advanced");
    }

    fn toast(&mut self, message: &str) {
        log::info!("{}", message);
        self.progress.println(format!("🐟 {}", message));
    }
}

/// Builds a tank from configuration and runs it headless
pub struct TankRunner {
    config: RunnerConfig,
    seed: u64,
    world: World,
    rng: Xoshiro256StarStar,
    progress: ProgressBar,
}

impl TankRunner {
    pub fn new(config: RunnerConfig) -> Result<Self> {
        let seed = config.run.seed.unwrap_or_else(rand::random);
        log::info!("Using seed {}", seed);

        let progress = if config.run.progress {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };

        let world = World::with_seed(config.tank.settings(), seed).with_events(ProgressEvents {
            progress: progress.clone(),
        });

        let mut runner = Self {
            rng: Xoshiro256StarStar::seed_from_u64(seed ^ FEEDER_SEED_SALT),
            config,
            seed,
            world,
            progress,
        };
        runner.place_decorations();
        runner.populate()?;
        Ok(runner)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn place_decorations(&mut self) {
        let tank = &self.config.tank;
        let kinds = [
            (DecorKind::Plant, tank.plants),
            (DecorKind::Rock, tank.rocks),
            (DecorKind::Coral, tank.corals),
        ];
        let bounds = self.world.bounds();
        for (kind, count) in kinds {
            for _ in 0..count {
                let radius = self.rng.random_range(DECOR_RADIUS);
                let x = self.rng.random_range(0.0..=bounds.width);
                // Scenery sits on the floor
                let position = Vec2::new(x, (bounds.height - radius * 0.5).max(0.0));
                self.world.add_decoration(Decoration::new(kind, position, radius));
            }
        }
    }

    fn populate(&mut self) -> Result<()> {
        match &self.config.population.load_path {
            Some(path) => {
                let records = export::read_records(path)?;
                self.world.load_records(records);
            }
            None => {
                let added = self.world.seed_population(self.config.population.initial);
                if added < self.config.population.initial {
                    log::warn!(
                        "Tank holds only {} of {} requested fish",
                        added,
                        self.config.population.initial
                    );
                }
            }
        }
        Ok(())
    }

    fn progress_style() -> Result<ProgressStyle> {
        Ok(ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("█▓░"))
    }

    fn feed(&mut self) {
        let bounds = self.world.bounds();
        for _ in 0..self.config.feeding.pellets_per_drop {
            let x = self.rng.random_range(bounds.width * 0.1..=bounds.width * 0.9);
            self.world.drop_pellet(Vec2::new(x, 0.0));
        }
    }

    /// Run for the configured duration and write any configured output
    pub fn run(&mut self) -> Result<RunSummary> {
        let run = self.config.run.clone();
        let dt = if run.dt > 0.0 { run.dt } else { 1.0 / 60.0 };
        let total_ticks = (run.duration_secs.max(0.0) / dt).ceil() as u64;

        self.progress.set_length(total_ticks);
        self.progress.set_style(Self::progress_style()?);
        self.progress.println(format!(
            "Starting run: {:.0}s simulated, {} fish, seed {}",
            run.duration_secs,
            self.world.count(),
            self.seed
        ));

        let feed_interval = self.config.feeding.interval_secs;
        let mut next_feed = 0.0;
        let mut next_sample = 0.0;
        let mut history = Vec::new();

        for tick in 0..total_ticks {
            let time = tick as f32 * dt;
            if feed_interval > 0.0 && time >= next_feed {
                self.feed();
                next_feed += feed_interval;
            }

            self.world.update(dt);

            if run.stats_interval_secs > 0.0 && time >= next_sample {
                let sample = PopulationSample::take(&self.world, time);
                log::info!(
                    "t={:.0}s living={} corpses={} courting={} pellets={}",
                    sample.time_secs,
                    sample.living,
                    sample.corpses,
                    sample.courting,
                    sample.pellets
                );
                self.progress.set_message(format!("{} fish", sample.living));
                history.push(sample);
                next_sample += run.stats_interval_secs;
            }
            self.progress.inc(1);
        }
        self.progress.finish_with_message("Run complete");

        let simulated_secs = total_ticks as f32 * dt;
        let summary = RunSummary {
            seed: self.seed,
            ticks: total_ticks,
            simulated_secs,
            stats: *self.world.stats(),
            discoveries: self.world.discoveries().keys().to_vec(),
            history,
            final_sample: PopulationSample::take(&self.world, simulated_secs),
        };

        if let Some(path) = &self.config.output.records_path {
            export::write_records(path, &self.world.records())?;
        }
        if let Some(path) = &self.config.output.summary_path {
            export::write_summary(path, &summary)?;
        }
        Ok(summary)
    }
}
