//! Command line runner: evaluates generations of random perceptron policies.

mod driver;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use driver::Driver;
use flap_core::DriverConfig;
use flap_world::{FrameSink, JsonLinesSink, NoopSink};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "flap-runner",
    version,
    about = "Evaluate populations of policies in the flapping obstacle course"
)]
struct Cli {
    /// JSON configuration file; missing fields use defaults.
    #[arg(short, long, env = "FLAP_CONFIG")]
    config: Option<PathBuf>,

    /// Number of generations to evaluate.
    #[arg(short, long)]
    generations: Option<u32>,

    /// Actors per generation.
    #[arg(short, long)]
    population: Option<usize>,

    /// Seed for policy sampling and obstacle gaps.
    #[arg(long)]
    seed: Option<u64>,

    /// Pace ticks to this rate instead of running flat out.
    #[arg(long)]
    tick_rate: Option<u32>,

    /// End a generation after this many ticks even if actors remain.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Write frames and generation summaries as JSON lines to this file.
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Only write every n-th frame to the snapshot file.
    #[arg(long, default_value_t = 1)]
    snapshot_every: u64,
}

impl Cli {
    fn driver_config(&self) -> Result<DriverConfig> {
        let mut config = match &self.config {
            Some(path) => DriverConfig::from_json_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => DriverConfig::default(),
        };

        if let Some(generations) = self.generations {
            config.generations = generations;
        }
        if let Some(population) = self.population {
            config.population_size = population;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
            config.evaluator.seed = seed;
        }
        if self.tick_rate.is_some() {
            config.evaluator.tick_rate_hz = self.tick_rate;
        }
        if self.max_ticks.is_some() {
            config.evaluator.max_ticks = self.max_ticks;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    fn sink(&self) -> Result<Box<dyn FrameSink + Send>> {
        match &self.snapshots {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                Ok(Box::new(
                    JsonLinesSink::new(BufWriter::new(file)).every(self.snapshot_every),
                ))
            }
            None => Ok(Box::new(NoopSink)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init_telemetry()?;

    let config = cli.driver_config()?;
    info!(
        generations = config.generations,
        population = config.population_size,
        seed = config.seed,
        "Starting flap-runner"
    );

    let quit = Arc::new(AtomicBool::new(false));
    let mut driver = Driver::new(config, quit.clone())?;
    let mut sink = cli.sink()?;

    tokio::spawn(watch_for_quit(quit));

    let (driver, stats) = tokio::task::spawn_blocking(move || {
        let stats = driver.run(sink.as_mut());
        (driver, stats)
    })
    .await
    .context("generation task panicked")?;
    let stats = stats?;

    info!(
        generations = driver.generations_completed(),
        best_ever = stats.best_ever,
        mean_of_means = stats.mean_of_means,
        "Shutting down runner"
    );

    if let Some(elite) = driver.elite() {
        println!("{}", serde_json::to_string_pretty(elite)?);
    }

    Ok(())
}

/// Set the quit flag on ctrl-c; the running generation stops after its
/// current tick.
async fn watch_for_quit(quit: Arc<AtomicBool>) {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
        return;
    }
    info!("Shutdown signal received");
    quit.store(true, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "flap-runner",
            "--generations",
            "7",
            "--population",
            "12",
            "--seed",
            "99",
            "--max-ticks",
            "500",
        ]);
        let config = cli.driver_config().unwrap();

        assert_eq!(config.generations, 7);
        assert_eq!(config.population_size, 12);
        assert_eq!(config.seed, 99);
        assert_eq!(config.evaluator.seed, 99);
        assert_eq!(config.evaluator.max_ticks, Some(500));
        assert_eq!(config.evaluator.tick_rate_hz, None);
    }

    #[test]
    fn test_zero_population_rejected() {
        let cli = Cli::parse_from(["flap-runner", "--population", "0"]);
        assert!(cli.driver_config().is_err());
    }

    #[test]
    fn test_config_file_with_overrides() {
        let path = std::env::temp_dir().join(format!("flap-runner-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{ "generations": 4, "evaluator": { "pipe": { "gap": 300.0 } } }"#,
        )
        .unwrap();

        let cli = Cli::parse_from([
            "flap-runner".to_string(),
            "--config".to_string(),
            path.display().to_string(),
            "--tick-rate".to_string(),
            "30".to_string(),
        ]);
        let config = cli.driver_config().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.generations, 4);
        assert_eq!(config.evaluator.pipe.gap, 300.0);
        assert_eq!(config.evaluator.tick_rate_hz, Some(30));
    }
}
