//! Statistics snapshots.
//!
//! A [`StatisticsSnapshot`] is the immutable input to every inference stage:
//! per-table row counts and per-column distinct/null fractions plus a bounded
//! set of sample values, captured from one environment. The engine never
//! talks to a database; it only reads snapshots.
//!
//! Snapshots are validated once at construction, either through
//! [`SnapshotBuilder::build`] or when deserialized from JSON, so downstream
//! stages can rely on the invariants:
//!
//! - every column belongs to a known table
//! - every fraction is finite and within `[0, 1]`
//! - sample values never exceed the sample bound
//!
//! # Example
//!
//! ```ignore
//! use relic::snapshot::{ColumnStats, SnapshotBuilder, TableStats};
//!
//! let snapshot = SnapshotBuilder::new("staging")
//!     .table("users", TableStats::new("public", 1_000))
//!     .column("users", "id", ColumnStats::new("integer", 1.0, 0.0))
//!     .build()?;
//! ```

mod fingerprint;
mod value;

pub use fingerprint::fingerprint;
pub use value::Value;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Default upper bound on sample values kept per column.
pub const DEFAULT_SAMPLE_LIMIT: usize = 1000;

/// One sampled row, columns in table order.
pub type Row = Vec<Value>;

/// Result type for snapshot construction.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Invariant violations detected while building a snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    /// Column statistics reference a table the snapshot does not contain.
    #[error("column '{column}' references unknown table '{table}'")]
    UnknownTable { table: String, column: String },

    /// A fraction is NaN, infinite or outside `[0, 1]`.
    #[error("{field} of {table}.{column} must be within [0, 1], got {value}")]
    InvalidFraction {
        table: String,
        column: String,
        field: &'static str,
        value: f64,
    },

    /// The environment identifier is empty.
    #[error("snapshot environment must not be empty")]
    EmptyEnvironment,
}

/// Table-level statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStats {
    /// Schema the table lives in.
    #[serde(default)]
    pub schema_name: String,
    pub row_count: u64,
    #[serde(default)]
    pub size_bytes: u64,
    /// Key declared in the catalog, if any.
    ///
    /// Never used as evidence. Only compared against the inferred key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_primary_key: Option<Vec<String>>,
}

impl TableStats {
    pub fn new(schema_name: impl Into<String>, row_count: u64) -> Self {
        Self {
            schema_name: schema_name.into(),
            row_count,
            size_bytes: 0,
            declared_primary_key: None,
        }
    }

    #[must_use]
    pub fn with_size_bytes(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    #[must_use]
    pub fn with_declared_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_primary_key = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}

/// Column-level statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub data_type: String,
    /// Fraction of rows that are NULL.
    pub null_fraction: f64,
    /// Distinct non-null values divided by the table's row count.
    pub distinct_fraction: f64,
    #[serde(default)]
    pub sample_values: Vec<Value>,
    #[serde(default)]
    pub is_indexed: bool,
}

impl ColumnStats {
    pub fn new(data_type: impl Into<String>, distinct_fraction: f64, null_fraction: f64) -> Self {
        Self {
            data_type: data_type.into(),
            null_fraction,
            distinct_fraction,
            sample_values: Vec::new(),
            is_indexed: false,
        }
    }

    #[must_use]
    pub fn with_samples<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.sample_values = values.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.is_indexed = true;
        self
    }

    /// Distinct non-null sample values.
    pub fn distinct_samples(&self) -> HashSet<&Value> {
        self.sample_values.iter().filter(|v| !v.is_null()).collect()
    }

    /// Whether every row of the column is NULL.
    pub fn is_all_null(&self) -> bool {
        self.null_fraction >= 1.0
    }
}

/// Immutable per-environment statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSnapshot")]
pub struct StatisticsSnapshot {
    environment: String,
    tables: BTreeMap<String, TableStats>,
    columns: BTreeMap<String, BTreeMap<String, ColumnStats>>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    environment: String,
    tables: BTreeMap<String, TableStats>,
    #[serde(default)]
    columns: BTreeMap<String, BTreeMap<String, ColumnStats>>,
}

impl TryFrom<RawSnapshot> for StatisticsSnapshot {
    type Error = SnapshotError;

    fn try_from(raw: RawSnapshot) -> SnapshotResult<Self> {
        SnapshotBuilder {
            environment: raw.environment,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            tables: raw.tables,
            columns: raw.columns,
        }
        .build()
    }
}

impl StatisticsSnapshot {
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Tables in lexical order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableStats)> {
        self.tables.iter().map(|(name, stats)| (name.as_str(), stats))
    }

    pub fn table(&self, name: &str) -> Option<&TableStats> {
        self.tables.get(name)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Columns of a table in lexical order.
    pub fn columns(&self, table: &str) -> impl Iterator<Item = (&str, &ColumnStats)> {
        self.columns
            .get(table)
            .into_iter()
            .flat_map(|cols| cols.iter().map(|(name, stats)| (name.as_str(), stats)))
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnStats> {
        self.columns.get(table).and_then(|cols| cols.get(column))
    }

    pub fn column_count(&self, table: &str) -> usize {
        self.columns.get(table).map_or(0, BTreeMap::len)
    }

    /// SHA256 over the canonical JSON form.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        fingerprint(self)
    }
}

/// Validating builder for [`StatisticsSnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    environment: String,
    sample_limit: usize,
    tables: BTreeMap<String, TableStats>,
    columns: BTreeMap<String, BTreeMap<String, ColumnStats>>,
}

impl SnapshotBuilder {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            tables: BTreeMap::new(),
            columns: BTreeMap::new(),
        }
    }

    /// Cap on sample values kept per column. Longer sequences are truncated.
    #[must_use]
    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = limit;
        self
    }

    #[must_use]
    pub fn table(mut self, name: impl Into<String>, stats: TableStats) -> Self {
        self.tables.insert(name.into(), stats);
        self
    }

    #[must_use]
    pub fn column(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        stats: ColumnStats,
    ) -> Self {
        self.columns
            .entry(table.into())
            .or_default()
            .insert(column.into(), stats);
        self
    }

    pub fn build(mut self) -> SnapshotResult<StatisticsSnapshot> {
        if self.environment.trim().is_empty() {
            return Err(SnapshotError::EmptyEnvironment);
        }

        for (table, cols) in &mut self.columns {
            for (column, stats) in cols.iter_mut() {
                if !self.tables.contains_key(table) {
                    return Err(SnapshotError::UnknownTable {
                        table: table.clone(),
                        column: column.clone(),
                    });
                }
                check_fraction(table, column, "null_fraction", stats.null_fraction)?;
                check_fraction(table, column, "distinct_fraction", stats.distinct_fraction)?;
                stats.sample_values.truncate(self.sample_limit);
            }
        }

        for table in self.tables.keys() {
            self.columns.entry(table.clone()).or_default();
        }

        Ok(StatisticsSnapshot {
            environment: self.environment,
            tables: self.tables,
            columns: self.columns,
        })
    }
}

fn check_fraction(table: &str, column: &str, field: &'static str, value: f64) -> SnapshotResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SnapshotError::InvalidFraction {
            table: table.to_string(),
            column: column.to_string(),
            field,
            value,
        })
    }
}
