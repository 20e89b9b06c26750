//! The per-environment pipeline.
//!
//! ```text
//! get_snapshot ─▶ keys ─▶ foreign keys + cardinality ─▶ similarity ─▶ profile
//!                                                                       │
//!                        get_sample_rows (per table) ─▶ duplicates ◀────┘
//! ```
//!
//! Stages run in order. Each one writes its output to the progress slot
//! before the next starts, and the task yields between stages so a deadline
//! abort lands between them rather than after the whole pipeline.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::cancel::CancellationSignal;
use super::progress::ProgressSlot;
use crate::catalog::{CatalogError, CatalogProvider};
use crate::inference::{CardinalitySummary, InferenceEngine};
use crate::report::InferenceReport;

/// Fatal errors of one environment. Rendered into its failed status.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("snapshot unavailable: {0}")]
    SnapshotUnavailable(#[source] CatalogError),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("analysis panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Completed,
    Cancelled,
}

pub(crate) struct EnvironmentPipeline {
    environment: String,
    provider: Arc<dyn CatalogProvider>,
    engine: Arc<InferenceEngine>,
    cancel: CancellationSignal,
    progress: ProgressSlot,
}

impl EnvironmentPipeline {
    pub(crate) fn new(
        environment: String,
        provider: Arc<dyn CatalogProvider>,
        engine: Arc<InferenceEngine>,
        cancel: CancellationSignal,
        progress: ProgressSlot,
    ) -> Self {
        Self {
            environment,
            provider,
            engine,
            cancel,
            progress,
        }
    }

    /// Wait for a worker, run the stages and turn the outcome into a report.
    ///
    /// Never fails: catalog errors and panics become a failed report.
    pub(crate) async fn execute(self, workers: Arc<Semaphore>) -> InferenceReport {
        if self.cancel.is_cancelled() {
            return self.progress.cancel();
        }
        let _permit = match workers.acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return self.progress.fail("worker pool closed"),
        };
        self.progress.start();
        info!(environment = %self.environment, "Analysing environment");

        let report = match AssertUnwindSafe(self.run()).catch_unwind().await {
            Ok(Ok(Outcome::Completed)) => self.progress.complete(),
            Ok(Ok(Outcome::Cancelled)) => self.progress.cancel(),
            Ok(Err(err)) => {
                warn!(environment = %self.environment, error = %err, "Environment failed");
                self.progress.fail(err.to_string())
            }
            Err(payload) => {
                let err = PipelineError::Panicked(panic_message(payload.as_ref()));
                warn!(environment = %self.environment, error = %err, "Environment failed");
                self.progress.fail(err.to_string())
            }
        };

        info!(
            environment = %self.environment,
            status = %report.status,
            relationships = report.relationships.len(),
            duration_ms = report.duration_ms,
            "Environment finished"
        );
        report
    }

    #[instrument(skip(self), fields(environment = %self.environment))]
    async fn run(&self) -> Result<Outcome, PipelineError> {
        if self.cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }
        let snapshot = self
            .provider
            .get_snapshot(&self.environment)
            .await
            .map_err(PipelineError::SnapshotUnavailable)?;
        if self.cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        if snapshot.environment() != self.environment {
            return Err(PipelineError::InvalidSnapshot(format!(
                "requested '{}' but received '{}'",
                self.environment,
                snapshot.environment()
            )));
        }
        let fingerprint = snapshot
            .fingerprint()
            .map_err(|e| PipelineError::InvalidSnapshot(e.to_string()))?;
        self.progress.update(|r| {
            r.snapshot_fingerprint = Some(fingerprint);
            r.table_count = snapshot.table_count();
        });

        let keys = self.engine.score_keys(&snapshot);
        debug!(
            keys = keys.candidates.len(),
            without_key = keys.tables_without_key.len(),
            "Scored primary keys"
        );
        self.progress.update(|r| {
            r.primary_keys = keys.candidates.clone();
            r.tables_without_key = keys.tables_without_key.clone();
        });
        tokio::task::yield_now().await;

        let candidates = self.engine.match_foreign_keys(&snapshot, &keys);
        let edges = self.engine.classify_cardinality(&snapshot, &candidates);
        let summary = CardinalitySummary::from_edges(&edges);
        debug!(candidates = candidates.len(), summary = %summary, "Classified relationships");
        self.progress.update(|r| {
            r.relationships = edges;
            r.cardinality_summary = summary;
        });
        tokio::task::yield_now().await;

        let similarity = self.engine.compare_tables(&snapshot);
        debug!(pairs = similarity.pairs.len(), "Compared tables");
        if let Some(degradation) = &similarity.degradation {
            warn!(
                tables = degradation.table_count,
                max_tables = degradation.max_tables,
                "Similarity comparison degraded"
            );
            self.progress.note(degradation.note.clone());
        }
        self.progress.update(|r| {
            r.similar_tables = similarity.pairs;
            r.similarity_degradation = similarity.degradation;
        });
        tokio::task::yield_now().await;

        let findings = self.engine.profile_columns(&snapshot);
        debug!(findings = findings.len(), "Profiled columns");
        self.progress.update(|r| r.column_findings = findings);
        tokio::task::yield_now().await;

        let limit = self.engine.duplicate_sample_limit();
        for (table, _) in snapshot.tables() {
            if self.cancel.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }
            match self
                .provider
                .get_sample_rows(&self.environment, table, limit)
                .await
            {
                Ok(rows) => {
                    let estimate = self.engine.estimate_duplicates(table, &rows);
                    debug!(
                        table,
                        sample_size = estimate.sample_size,
                        fraction = estimate.duplicate_row_fraction,
                        "Estimated duplicates"
                    );
                    self.progress.update(|r| r.duplicates.push(estimate));
                }
                Err(err) => {
                    warn!(table, error = %err, "Sample rows unavailable");
                    self.progress
                        .note(format!("duplicate estimate for '{}' skipped: {}", table, err));
                }
            }
            if self.cancel.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }
        }

        Ok(Outcome::Completed)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
