//! Duplicate row estimation from sampled rows.
//!
//! Rows are grouped by full-row equality. The result is always an estimate
//! over the sample it was computed from and says so: `basis` is `sample` and
//! `sample_size` is reported next to every fraction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::thresholds::duplicates as defaults;
use crate::config::{check_fraction, ConfigError};
use crate::snapshot::Row;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateConfig {
    /// Rows requested per table.
    pub sample_limit: usize,
    /// Duplicate fraction above which severity is HIGH.
    pub high_severity: f64,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            sample_limit: defaults::SAMPLE_LIMIT,
            high_severity: defaults::HIGH_SEVERITY,
        }
    }
}

impl DuplicateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("duplicates.high_severity", self.high_severity)?;
        if self.sample_limit == 0 {
            return Err(ConfigError::ZeroLimit("duplicates.sample_limit"));
        }
        Ok(())
    }
}

/// How a duplicate figure was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateBasis {
    Sample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuplicateSeverity {
    /// Empty sample.
    Unknown,
    None,
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateEstimate {
    pub table: String,
    pub duplicate_row_fraction: f64,
    /// Distinct row values seen more than once.
    pub sample_group_count: usize,
    pub sample_size: usize,
    pub distinct_rows: usize,
    /// Rows beyond the first copy of each value.
    pub excess_rows: usize,
    pub basis: EstimateBasis,
    pub severity: DuplicateSeverity,
}

#[derive(Debug, Clone, Default)]
pub struct DuplicateRowDetector {
    config: DuplicateConfig,
}

impl DuplicateRowDetector {
    pub fn new(config: DuplicateConfig) -> Self {
        Self { config }
    }

    pub fn sample_limit(&self) -> usize {
        self.config.sample_limit
    }

    /// Estimate duplication in `rows`, considering at most `sample_limit` of them.
    pub fn estimate(&self, table: &str, rows: &[Row]) -> DuplicateEstimate {
        let rows = &rows[..rows.len().min(self.config.sample_limit)];

        let mut counts: HashMap<&Row, usize> = HashMap::new();
        for row in rows {
            *counts.entry(row).or_insert(0) += 1;
        }

        let sample_size = rows.len();
        let distinct_rows = counts.len();
        let excess_rows = sample_size - distinct_rows;
        let sample_group_count = counts.values().filter(|&&n| n > 1).count();

        let (duplicate_row_fraction, severity) = if sample_size == 0 {
            (0.0, DuplicateSeverity::Unknown)
        } else {
            let fraction = excess_rows as f64 / sample_size as f64;
            let severity = if fraction > self.config.high_severity {
                DuplicateSeverity::High
            } else if fraction > 0.0 {
                DuplicateSeverity::Low
            } else {
                DuplicateSeverity::None
            };
            (fraction, severity)
        };

        DuplicateEstimate {
            table: table.to_string(),
            duplicate_row_fraction,
            sample_group_count,
            sample_size,
            distinct_rows,
            excess_rows,
            basis: EstimateBasis::Sample,
            severity,
        }
    }
}
