//! Parallel environment orchestrator.
//!
//! Runs the inference pipeline once per environment, a bounded number at a
//! time, and collects one report per environment into a [`ResultSet`].
//!
//! # Architecture
//!
//! ```text
//!                      ┌────────────────────────┐
//!  environments ─────▶ │      Orchestrator      │
//!                      │  Semaphore(workers)    │
//!                      └────────────────────────┘
//!                        │        │         │
//!                        ▼        ▼         ▼
//!                    ┌───────┐┌───────┐┌───────┐
//!                    │  dev  ││  qa   ││ prod  │   one task each,
//!                    └───────┘└───────┘└───────┘   own snapshot, own slot
//!                        │        │         │
//!                        ▼        ▼         ▼
//!                      ┌────────────────────────┐
//!                      │    ResultSetWriter     │   one write per environment
//!                      └────────────────────────┘
//! ```
//!
//! An environment that fails or panics gets a failed report; its siblings
//! are unaffected. When the global deadline elapses, running environments
//! are aborted and reported partial with the stages they finished. A
//! cancelled run reports unfinished environments as cancelled.
//!
//! # Example
//!
//! ```ignore
//! use relic::catalog::JsonCatalogProvider;
//! use relic::config::RunConfig;
//! use relic::orchestrator::run_inference;
//!
//! let provider = Arc::new(JsonCatalogProvider::new("exports"));
//! let config = RunConfig::default().with_timeout(Duration::from_secs(60));
//! let results = run_inference(provider, ["dev", "prod"], config).await?;
//! println!("{}", results.summary);
//! ```

mod cancel;
mod pipeline;
mod progress;
mod writer;

pub use cancel::CancellationSignal;
pub use pipeline::PipelineError;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::CatalogProvider;
use crate::config::{ConfigError, RunConfig};
use crate::inference::InferenceEngine;
use crate::report::ResultSet;
use pipeline::EnvironmentPipeline;
use progress::ProgressSlot;
use writer::ResultSetWriter;

/// Runs inference across environments with a validated [`RunConfig`].
pub struct Orchestrator {
    provider: Arc<dyn CatalogProvider>,
    engine: Arc<InferenceEngine>,
    config: RunConfig,
    cancel: CancellationSignal,
}

impl Orchestrator {
    /// Validate the configuration. Nothing runs if it is rejected.
    pub fn new(provider: Arc<dyn CatalogProvider>, config: RunConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let engine = InferenceEngine::new(config.resolved_inference())?;
        Ok(Self {
            provider,
            engine: Arc::new(engine),
            config,
            cancel: CancellationSignal::new(),
        })
    }

    /// Use an externally owned cancellation signal.
    #[must_use]
    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancel = signal;
        self
    }

    /// Handle that cancels this orchestrator's runs.
    pub fn cancellation(&self) -> CancellationSignal {
        self.cancel.clone()
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Analyse every environment and return once each has a report.
    ///
    /// Duplicate environment names are analysed once.
    pub async fn run<I, S>(&self, environments: I) -> ResultSet
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let environments: BTreeSet<String> = environments.into_iter().map(Into::into).collect();
        let workers = self.config.worker_count(environments.len());

        info!(
            run_id = %run_id,
            environments = environments.len(),
            workers,
            "Starting inference run"
        );

        let writer = Arc::new(ResultSetWriter::new());
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut slots = BTreeMap::new();
        let mut tasks = JoinSet::new();

        for environment in &environments {
            let slot = ProgressSlot::new(environment);
            slots.insert(environment.clone(), slot.clone());

            let pipeline = EnvironmentPipeline::new(
                environment.clone(),
                Arc::clone(&self.provider),
                Arc::clone(&self.engine),
                self.cancel.clone(),
                slot,
            );
            let semaphore = Arc::clone(&semaphore);
            let writer = Arc::clone(&writer);
            tasks.spawn(async move {
                let report = pipeline.execute(semaphore).await;
                writer.record(report);
            });
        }

        let finished = match self.config.timeout() {
            Some(limit) => tokio::time::timeout(limit, drain(&mut tasks)).await.is_ok(),
            None => {
                drain(&mut tasks).await;
                true
            }
        };
        if !finished {
            warn!(
                run_id = %run_id,
                running = tasks.len(),
                "Deadline elapsed, aborting unfinished environments"
            );
            tasks.abort_all();
            drain(&mut tasks).await;
        }

        for (environment, slot) in &slots {
            if writer.contains(environment) {
                continue;
            }
            let report = if self.cancel.is_cancelled() {
                slot.cancel()
            } else if !finished {
                slot.interrupt(format!(
                    "deadline of {:.1}s elapsed before analysis completed",
                    self.config.timeout_secs.unwrap_or_default()
                ))
            } else {
                slot.fail("analysis task ended without a report")
            };
            warn!(environment = %environment, status = %report.status, "Environment did not finish");
            writer.record(report);
        }

        let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let results = writer.finish(run_id, elapsed);
        info!(
            run_id = %run_id,
            succeeded = results.summary.succeeded,
            partial = results.summary.partial,
            failed = results.summary.failed,
            cancelled = results.summary.cancelled,
            duration_ms = elapsed,
            "Inference run complete"
        );
        results
    }
}

async fn drain(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            if err.is_panic() {
                warn!(error = %err, "Environment task panicked outside the pipeline");
            }
        }
    }
}

/// Validate `config` and analyse `environments` with `provider`.
pub async fn run_inference<P, I, S>(
    provider: Arc<P>,
    environments: I,
    config: RunConfig,
) -> Result<ResultSet, ConfigError>
where
    P: CatalogProvider + 'static,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let orchestrator = Orchestrator::new(provider, config)?;
    Ok(orchestrator.run(environments).await)
}
