//! Relic CLI - infer relationships from exported schema statistics
//!
//! Usage:
//!   relic --snapshots <dir> [--env <name>]... [--config <file>] [--output <file>]
//!
//! Examples:
//!   relic --snapshots exports
//!   relic --snapshots exports --env staging --env prod --timeout-secs 120
//!   RUST_LOG=relic=debug relic --snapshots exports --output results.json

use clap::Parser;
use relic::catalog::JsonCatalogProvider;
use relic::config::{RunConfig, Settings};
use relic::orchestrator::Orchestrator;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relic")]
#[command(about = "Relic - infer keys, relationships and redundancy from schema statistics")]
#[command(version)]
struct Cli {
    /// Directory of `<environment>.json` exports
    #[arg(short, long)]
    snapshots: PathBuf,

    /// Environment to analyse (repeatable; defaults to every export in the directory)
    #[arg(short, long = "env")]
    environments: Vec<String>,

    /// Settings file (defaults to $RELIC_CONFIG, ./relic.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum environments analysed at once
    #[arg(long)]
    max_workers: Option<usize>,

    /// Global deadline for the run, in seconds
    #[arg(long)]
    timeout_secs: Option<f64>,

    /// Minimum match fraction for a MEDIUM foreign key
    #[arg(long)]
    min_fk_match: Option<f64>,

    /// Minimum similarity for a reported table pair
    #[arg(long)]
    similarity_threshold: Option<f64>,

    /// Write the result set here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig, String> {
        let settings = match &self.config {
            Some(path) => Settings::from_file(path),
            None => Settings::load(),
        }
        .map_err(|e| e.to_string())?;

        let mut config = settings.run_config().map_err(|e| e.to_string())?;
        if let Some(workers) = self.max_workers {
            config = config.with_max_workers(workers);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout_secs(secs);
        }
        if let Some(value) = self.min_fk_match {
            config = config.with_min_fk_match(value);
        }
        if let Some(value) = self.similarity_threshold {
            config = config.with_similarity_threshold(value);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relic=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match cli.run_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let provider = JsonCatalogProvider::new(&cli.snapshots);
    let environments = if cli.environments.is_empty() {
        match provider.discover().await {
            Ok(found) => found,
            Err(e) => {
                eprintln!("Error reading '{}': {}", cli.snapshots.display(), e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        cli.environments.clone()
    };
    if environments.is_empty() {
        eprintln!("No environments found in '{}'", cli.snapshots.display());
        return ExitCode::FAILURE;
    }

    let orchestrator = match Orchestrator::new(Arc::new(provider), config) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cancel = orchestrator.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            cancel.cancel();
        }
    });

    let results = orchestrator.run(environments).await;
    info!(summary = %results.summary, "Run finished");

    let json = match results.to_json_pretty() {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serializing results: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match &cli.output {
        Some(path) => {
            if let Err(e) = fs::write(path, json) {
                eprintln!("Error writing '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
        None => println!("{}", json),
    }

    if results.summary.failed > 0 || results.summary.cancelled > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
