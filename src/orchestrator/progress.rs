//! Per-environment progress slot.
//!
//! The pipeline records each stage's output here as soon as the stage
//! finishes. When an environment is aborted at the deadline, the
//! orchestrator turns whatever the slot holds into a partial report.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::report::{InferenceReport, ReportStatus};

#[derive(Debug)]
struct Progress {
    report: InferenceReport,
    reasons: Vec<String>,
    started: Instant,
}

/// Shared between one environment's task and the orchestrator.
#[derive(Debug, Clone)]
pub(crate) struct ProgressSlot {
    inner: Arc<Mutex<Progress>>,
}

impl ProgressSlot {
    pub(crate) fn new(environment: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Progress {
                report: InferenceReport::new(environment, ReportStatus::Success),
                reasons: Vec::new(),
                started: Instant::now(),
            })),
        }
    }

    // A panicking stage never holds the lock, but the guard is recovered anyway.
    fn lock(&self) -> MutexGuard<'_, Progress> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restart the clock once a worker picks the environment up.
    pub(crate) fn start(&self) {
        self.lock().started = Instant::now();
    }

    pub(crate) fn update(&self, apply: impl FnOnce(&mut InferenceReport)) {
        apply(&mut self.lock().report);
    }

    /// Record a reason the report will be partial.
    pub(crate) fn note(&self, reason: impl Into<String>) {
        self.lock().reasons.push(reason.into());
    }

    /// Success, or partial when any reason was noted.
    pub(crate) fn complete(&self) -> InferenceReport {
        let mut progress = self.lock();
        let status = if progress.reasons.is_empty() {
            ReportStatus::Success
        } else {
            ReportStatus::Partial {
                reasons: progress.reasons.clone(),
            }
        };
        finish(&mut progress, status)
    }

    pub(crate) fn fail(&self, reason: impl Into<String>) -> InferenceReport {
        finish(
            &mut self.lock(),
            ReportStatus::Failed {
                reason: reason.into(),
            },
        )
    }

    pub(crate) fn cancel(&self) -> InferenceReport {
        finish(&mut self.lock(), ReportStatus::Cancelled)
    }

    /// Partial report for an environment cut off before it finished.
    pub(crate) fn interrupt(&self, reason: impl Into<String>) -> InferenceReport {
        let mut progress = self.lock();
        let mut reasons = progress.reasons.clone();
        reasons.push(reason.into());
        finish(&mut progress, ReportStatus::Partial { reasons })
    }
}

fn finish(progress: &mut Progress, status: ReportStatus) -> InferenceReport {
    let mut report = progress.report.clone();
    report.status = status;
    report.duration_ms = u64::try_from(progress.started.elapsed().as_millis()).unwrap_or(u64::MAX);
    report
}
