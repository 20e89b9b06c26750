//! Append-only collector for environment reports.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::report::{InferenceReport, ResultSet};

/// Accepts exactly one report per environment, from any task.
#[derive(Debug, Default)]
pub(crate) struct ResultSetWriter {
    reports: DashMap<String, InferenceReport>,
}

impl ResultSetWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store a report. Returns `false` if the environment already has one.
    pub(crate) fn record(&self, report: InferenceReport) -> bool {
        match self.reports.entry(report.environment.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(report);
                true
            }
        }
    }

    pub(crate) fn contains(&self, environment: &str) -> bool {
        self.reports.contains_key(environment)
    }

    pub(crate) fn finish(&self, run_id: Uuid, duration_ms: u64) -> ResultSet {
        let environments: BTreeMap<String, InferenceReport> = self
            .reports
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        ResultSet::new(run_id, environments, duration_ms)
    }
}
