//! Column data-quality findings derived from snapshot statistics alone.

use serde::{Deserialize, Serialize};

use super::thresholds::profile as defaults;
use crate::config::{check_fraction, ConfigError};
use crate::snapshot::{ColumnStats, StatisticsSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub mostly_null: f64,
    pub high_null_rate: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            mostly_null: defaults::MOSTLY_NULL,
            high_null_rate: defaults::HIGH_NULL_RATE,
        }
    }
}

impl ProfileConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("profile.mostly_null", self.mostly_null)?;
        check_fraction("profile.high_null_rate", self.high_null_rate)?;
        if self.high_null_rate > self.mostly_null {
            return Err(ConfigError::ThresholdOrder(
                "profile.high_null_rate must not exceed profile.mostly_null".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    MostlyNull,
    HighNullRate,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFinding {
    pub table: String,
    pub column: String,
    pub kind: FindingKind,
    pub detail: String,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnProfiler {
    config: ProfileConfig,
}

impl ColumnProfiler {
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }

    fn inspect(&self, row_count: u64, stats: &ColumnStats) -> Option<(FindingKind, String)> {
        let null_pct = stats.null_fraction * 100.0;
        if stats.null_fraction > self.config.mostly_null {
            return Some((FindingKind::MostlyNull, format!("{:.1}% NULL", null_pct)));
        }
        if stats.null_fraction > self.config.high_null_rate {
            return Some((FindingKind::HighNullRate, format!("{:.1}% NULL", null_pct)));
        }

        let distinct_values = (stats.distinct_fraction * row_count as f64).round();
        if row_count > 1 && distinct_values <= 1.0 {
            return Some((
                FindingKind::Constant,
                format!("at most one distinct value across {} rows", row_count),
            ));
        }
        None
    }

    /// Findings ordered by table, then column.
    pub fn profile(&self, snapshot: &StatisticsSnapshot) -> Vec<ColumnFinding> {
        let mut findings = Vec::new();
        for (table, table_stats) in snapshot.tables() {
            for (column, stats) in snapshot.columns(table) {
                if let Some((kind, detail)) = self.inspect(table_stats.row_count, stats) {
                    findings.push(ColumnFinding {
                        table: table.to_string(),
                        column: column.to_string(),
                        kind,
                        detail,
                    });
                }
            }
        }
        findings
    }
}
