use clap::Parser;
use reeftank::{RunnerConfig, TankRunner};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of ./reeftank.ron
    #[arg(long)]
    config: Option<PathBuf>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated seconds to run
    #[arg(long)]
    duration: Option<f32>,

    /// Write the final population as RON fish records
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write a RON run summary
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Start from a RON file of fish records instead of a random population
    #[arg(long)]
    load: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

impl Args {
    /// CLI flags take priority over every configuration layer
    fn apply(self, config: &mut RunnerConfig) {
        if let Some(seed) = self.seed {
            config.run.seed = Some(seed);
        }
        if let Some(duration) = self.duration {
            config.run.duration_secs = duration;
        }
        if self.output.is_some() {
            config.output.records_path = self.output;
        }
        if self.summary.is_some() {
            config.output.summary_path = self.summary;
        }
        if self.load.is_some() {
            config.population.load_path = self.load;
        }
        if self.quiet {
            config.run.progress = false;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = RunnerConfig::load_from(args.config.as_deref())?;
    args.apply(&mut config);

    let mut runner = TankRunner::new(config)?;
    let summary = runner.run()?;

    log::info!(
        "Finished after {:.0}s: {} living, {} corpses, {} births, {} deaths, {} litters, generation {}",
        summary.simulated_secs,
        summary.final_sample.living,
        summary.final_sample.corpses,
        summary.stats.births,
        summary.stats.deaths,
        summary.stats.litters,
        summary.stats.max_generation
    );
    log::info!(
        "{} pattern/fin combinations discovered (seed {})",
        summary.discoveries.len(),
        summary.seed
    );
    Ok(())
}
