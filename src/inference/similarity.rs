//! Structural similarity between tables.
//!
//! Two tables are compared by their column sets (case-insensitive names):
//!
//! ```text
//! similarity = |shared columns with compatible types| / |all column names|
//! ```
//!
//! A second ratio, `content_similarity`, repeats the computation after
//! dropping utility columns (`id`, `created_at`, ...) that almost every table
//! carries and that otherwise inflate the score of unrelated tables.
//!
//! The comparison is quadratic in the number of tables. Above
//! [`SimilarityConfig::max_tables`] the configured [`ScaleStrategy`] applies
//! and the outcome carries a [`SimilarityDegradation`] describing what was
//! skipped.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::thresholds::similarity as defaults;
use super::types::types_compatible;
use crate::config::{check_fraction, ConfigError};
use crate::snapshot::StatisticsSnapshot;

/// What to do when a snapshot has more tables than the comparison cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleStrategy {
    /// Compare only tables that share a schema.
    #[default]
    SameSchema,
    /// Skip the comparison entirely.
    Decline,
}

impl fmt::Display for ScaleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameSchema => write!(f, "same_schema"),
            Self::Decline => write!(f, "decline"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Consolidate,
    Review,
    Monitor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Pairs below this similarity are dropped.
    pub threshold: f64,
    pub max_tables: usize,
    pub scale_strategy: ScaleStrategy,
    /// Columns ignored by `content_similarity`, matched case-insensitively.
    pub utility_columns: Vec<String>,
    pub consolidate_at: f64,
    pub review_at: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::THRESHOLD,
            max_tables: defaults::MAX_TABLES,
            scale_strategy: ScaleStrategy::default(),
            utility_columns: defaults::UTILITY_COLUMNS.iter().map(|c| c.to_string()).collect(),
            consolidate_at: defaults::CONSOLIDATE,
            review_at: defaults::REVIEW,
        }
    }
}

impl SimilarityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("similarity.threshold", self.threshold)?;
        check_fraction("similarity.consolidate_at", self.consolidate_at)?;
        check_fraction("similarity.review_at", self.review_at)?;
        if self.max_tables == 0 {
            return Err(ConfigError::ZeroLimit("similarity.max_tables"));
        }
        if self.review_at > self.consolidate_at {
            return Err(ConfigError::ThresholdOrder(
                "similarity.review_at must not exceed similarity.consolidate_at".into(),
            ));
        }
        Ok(())
    }

    fn recommend(&self, score: f64) -> Recommendation {
        if score >= self.consolidate_at {
            Recommendation::Consolidate
        } else if score >= self.review_at {
            Recommendation::Review
        } else {
            Recommendation::Monitor
        }
    }
}

/// A pair of structurally similar tables. `table_a < table_b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityPair {
    pub table_a: String,
    pub table_b: String,
    pub similarity: f64,
    /// Similarity without utility columns; `None` when only utility columns exist.
    pub content_similarity: Option<f64>,
    pub shared_columns: BTreeSet<String>,
    pub exclusive_a: BTreeSet<String>,
    pub exclusive_b: BTreeSet<String>,
    /// Names present in both tables with incompatible types.
    pub type_conflicts: BTreeSet<String>,
    pub recommendation: Recommendation,
}

/// Explains a comparison that did not cover every table pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityDegradation {
    pub strategy: ScaleStrategy,
    /// Every table of the snapshot, including those without columns.
    pub table_count: usize,
    pub max_tables: usize,
    /// Schemas left out because they alone exceed the cap.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_schemas: Vec<String>,
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityOutcome {
    pub pairs: Vec<SimilarityPair>,
    pub degradation: Option<SimilarityDegradation>,
}

struct TableShape<'a> {
    name: &'a str,
    schema: &'a str,
    columns: BTreeMap<String, &'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct SimilarityComparator {
    config: SimilarityConfig,
}

impl SimilarityComparator {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    fn shapes<'a>(&self, snapshot: &'a StatisticsSnapshot) -> Vec<TableShape<'a>> {
        snapshot
            .tables()
            .filter_map(|(name, stats)| {
                let columns: BTreeMap<String, &str> = snapshot
                    .columns(name)
                    .map(|(column, col)| (column.to_lowercase(), col.data_type.as_str()))
                    .collect();
                (!columns.is_empty()).then_some(TableShape {
                    name,
                    schema: stats.schema_name.as_str(),
                    columns,
                })
            })
            .collect()
    }

    /// Compare two tables. `None` when either table is missing or has no columns.
    pub fn compare_tables(&self, snapshot: &StatisticsSnapshot, a: &str, b: &str) -> Option<SimilarityPair> {
        let shapes = self.shapes(snapshot);
        let left = shapes.iter().find(|s| s.name == a)?;
        let right = shapes.iter().find(|s| s.name == b)?;
        Some(self.compare_shapes(left, right))
    }

    fn compare_shapes(&self, a: &TableShape<'_>, b: &TableShape<'_>) -> SimilarityPair {
        let (a, b) = if a.name <= b.name { (a, b) } else { (b, a) };

        let mut shared = BTreeSet::new();
        let mut conflicts = BTreeSet::new();
        let mut exclusive_a = BTreeSet::new();
        for (name, data_type) in &a.columns {
            match b.columns.get(name) {
                Some(other) if types_compatible(data_type, other) => {
                    shared.insert(name.clone());
                }
                Some(_) => {
                    conflicts.insert(name.clone());
                }
                None => {
                    exclusive_a.insert(name.clone());
                }
            }
        }
        let exclusive_b: BTreeSet<String> = b
            .columns
            .keys()
            .filter(|name| !a.columns.contains_key(*name))
            .cloned()
            .collect();

        let union = a.columns.len() + exclusive_b.len();
        let similarity = shared.len() as f64 / union as f64;

        let is_utility = |name: &str| {
            self.config
                .utility_columns
                .iter()
                .any(|u| u.eq_ignore_ascii_case(name))
        };
        let content_shared = shared.iter().filter(|n| !is_utility(n.as_str())).count();
        let content_union = a
            .columns
            .keys()
            .chain(exclusive_b.iter())
            .filter(|n| !is_utility(n.as_str()))
            .count();
        let content_similarity = (content_union > 0).then(|| content_shared as f64 / content_union as f64);

        SimilarityPair {
            table_a: a.name.to_string(),
            table_b: b.name.to_string(),
            similarity,
            content_similarity,
            shared_columns: shared,
            exclusive_a,
            exclusive_b,
            type_conflicts: conflicts,
            recommendation: self.config.recommend(content_similarity.unwrap_or(similarity)),
        }
    }

    fn compare_group(&self, group: &[&TableShape<'_>], pairs: &mut Vec<SimilarityPair>) {
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                let pair = self.compare_shapes(a, b);
                if pair.similarity >= self.config.threshold {
                    pairs.push(pair);
                }
            }
        }
    }

    /// Compare every eligible pair of tables, honouring the scale cap.
    pub fn compare_snapshot(&self, snapshot: &StatisticsSnapshot) -> SimilarityOutcome {
        let shapes = self.shapes(snapshot);
        let max_tables = self.config.max_tables;
        let table_count = snapshot.table_count();
        let mut outcome = SimilarityOutcome::default();

        if table_count <= max_tables {
            let all: Vec<&TableShape<'_>> = shapes.iter().collect();
            self.compare_group(&all, &mut outcome.pairs);
        } else {
            match self.config.scale_strategy {
                ScaleStrategy::Decline => {
                    outcome.degradation = Some(SimilarityDegradation {
                        strategy: ScaleStrategy::Decline,
                        table_count,
                        max_tables,
                        skipped_schemas: Vec::new(),
                        note: format!(
                            "similarity comparison declined: {} tables exceed the limit of {}",
                            table_count, max_tables
                        ),
                    });
                }
                ScaleStrategy::SameSchema => {
                    let mut by_schema: BTreeMap<&str, Vec<&TableShape<'_>>> = BTreeMap::new();
                    for shape in &shapes {
                        by_schema.entry(shape.schema).or_default().push(shape);
                    }

                    let mut skipped_schemas = Vec::new();
                    for (schema, group) in &by_schema {
                        if group.len() > max_tables {
                            skipped_schemas.push(schema.to_string());
                        } else {
                            self.compare_group(group, &mut outcome.pairs);
                        }
                    }

                    let mut note = format!(
                        "{} tables exceed the limit of {}; only tables within the same schema were compared",
                        table_count, max_tables
                    );
                    if !skipped_schemas.is_empty() {
                        note.push_str(&format!(
                            "; schemas over the limit were skipped: {}",
                            skipped_schemas.join(", ")
                        ));
                    }
                    outcome.degradation = Some(SimilarityDegradation {
                        strategy: ScaleStrategy::SameSchema,
                        table_count,
                        max_tables,
                        skipped_schemas,
                        note,
                    });
                }
            }
        }

        outcome.pairs.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.table_a.cmp(&b.table_a))
                .then_with(|| a.table_b.cmp(&b.table_b))
        });
        outcome
    }
}
