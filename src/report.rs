//! Per-environment reports and the run-wide result set.
//!
//! A [`ResultSet`] maps environment name to its [`InferenceReport`]. Reports
//! are keyed by environment, so the serialized document is ordered
//! lexically regardless of which environment finished first.
//!
//! ```text
//! ResultSet
//! ├── run_id        uuid v4
//! ├── environments  { "dev": InferenceReport, "prod": InferenceReport, ... }
//! └── summary       totals per status, run duration
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::inference::{
    CardinalityEdge, CardinalitySummary, ColumnFinding, DuplicateEstimate, PrimaryKeyCandidate,
    SimilarityDegradation, SimilarityPair,
};

/// How an environment's analysis ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    /// Completed with reduced scope. Every reason names the limit that was hit.
    Partial { reasons: Vec<String> },
    Failed { reason: String },
    Cancelled,
}

impl ReportStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Partial { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Partial { .. } => write!(f, "partial"),
            Self::Failed { .. } => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Everything inferred for one environment.
///
/// Stages that never ran leave their fields empty; the status says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceReport {
    pub environment: String,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_fingerprint: Option<String>,
    #[serde(default)]
    pub table_count: usize,
    #[serde(default)]
    pub primary_keys: Vec<PrimaryKeyCandidate>,
    #[serde(default)]
    pub tables_without_key: Vec<String>,
    /// Foreign key candidates with their cardinality.
    #[serde(default)]
    pub relationships: Vec<CardinalityEdge>,
    #[serde(default)]
    pub cardinality_summary: CardinalitySummary,
    #[serde(default)]
    pub similar_tables: Vec<SimilarityPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_degradation: Option<SimilarityDegradation>,
    #[serde(default)]
    pub duplicates: Vec<DuplicateEstimate>,
    #[serde(default)]
    pub column_findings: Vec<ColumnFinding>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl InferenceReport {
    /// An empty report for an environment that has not produced anything yet.
    pub fn new(environment: impl Into<String>, status: ReportStatus) -> Self {
        Self {
            environment: environment.into(),
            status,
            snapshot_fingerprint: None,
            table_count: 0,
            primary_keys: Vec::new(),
            tables_without_key: Vec::new(),
            relationships: Vec::new(),
            cardinality_summary: CardinalitySummary::default(),
            similar_tables: Vec::new(),
            similarity_degradation: None,
            duplicates: Vec::new(),
            column_findings: Vec::new(),
            duration_ms: 0,
        }
    }
}

/// Totals per status for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a InferenceReport>, duration_ms: u64) -> Self {
        let mut summary = Self {
            duration_ms,
            ..Self::default()
        };
        for report in reports {
            summary.total += 1;
            match report.status {
                ReportStatus::Success => summary.succeeded += 1,
                ReportStatus::Partial { .. } => summary.partial += 1,
                ReportStatus::Failed { .. } => summary.failed += 1,
                ReportStatus::Cancelled => summary.cancelled += 1,
            }
        }
        summary
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} environments: {} succeeded, {} partial, {} failed, {} cancelled",
            self.total, self.succeeded, self.partial, self.failed, self.cancelled
        )
    }
}

/// Reports of every environment of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub run_id: Uuid,
    pub environments: BTreeMap<String, InferenceReport>,
    pub summary: RunSummary,
}

impl ResultSet {
    pub fn new(run_id: Uuid, environments: BTreeMap<String, InferenceReport>, duration_ms: u64) -> Self {
        let summary = RunSummary::from_reports(environments.values(), duration_ms);
        Self {
            run_id,
            environments,
            summary,
        }
    }

    pub fn get(&self, environment: &str) -> Option<&InferenceReport> {
        self.environments.get(environment)
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    /// Reports in environment order.
    pub fn reports(&self) -> impl Iterator<Item = &InferenceReport> {
        self.environments.values()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
