//! Primary key scoring.
//!
//! Every column of a table is scored by how close it comes to a perfect key:
//!
//! ```text
//! score = 100 × distinct_fraction × (1 − null_fraction)
//! ```
//!
//! The score is banded into a [`KeyLabel`]. One winner is kept per table.
//! Equal scores are resolved by fewer columns, then identifier-style names
//! (`id`, `*_id`, `*_key`), then indexed columns, then lexical order. Names and
//! indexes never add to the score itself.
//!
//! When no single column reaches [`KeyLabel::Good`], two-column combinations
//! are tried. Their joint distinct fraction is approximated as the product
//! of the individual fractions, `min(1, d₁ × d₂)`. This is not a joint
//! cardinality: correlated columns make it wrong in either direction, so
//! composite candidates are flagged `estimated` and should be read as
//! "worth checking", not as proof. The product never exceeds either input,
//! so with complete columns a composite cannot outscore its best member.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::naming::is_identifier_name;
use super::thresholds::key as defaults;
use crate::config::{check_fraction, check_score, ConfigError};
use crate::snapshot::{ColumnStats, StatisticsSnapshot};

/// Confidence band of a key candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyLabel {
    None,
    Weak,
    Good,
    Excellent,
    Perfect,
}

impl fmt::Display for KeyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "NONE",
            Self::Weak => "WEAK",
            Self::Good => "GOOD",
            Self::Excellent => "EXCELLENT",
            Self::Perfect => "PERFECT",
        };
        write!(f, "{}", s)
    }
}

/// Score bands for key labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyScoringConfig {
    pub perfect: f64,
    pub excellent: f64,
    pub good: f64,
    pub weak: f64,
    /// Minimum distinct fraction for a column to join a composite candidate.
    pub composite_min_distinct: f64,
    /// Try two-column combinations when no single column reaches GOOD.
    pub composite_search: bool,
}

impl Default for KeyScoringConfig {
    fn default() -> Self {
        Self {
            perfect: defaults::PERFECT,
            excellent: defaults::EXCELLENT,
            good: defaults::GOOD,
            weak: defaults::WEAK,
            composite_min_distinct: defaults::COMPOSITE_MIN_DISTINCT,
            composite_search: true,
        }
    }
}

impl KeyScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_score("primary_key.perfect", self.perfect)?;
        check_score("primary_key.excellent", self.excellent)?;
        check_score("primary_key.good", self.good)?;
        check_score("primary_key.weak", self.weak)?;
        check_fraction("primary_key.composite_min_distinct", self.composite_min_distinct)?;

        if !(self.weak <= self.good && self.good <= self.excellent && self.excellent <= self.perfect) {
            return Err(ConfigError::ThresholdOrder(
                "primary_key bands must satisfy weak <= good <= excellent <= perfect".into(),
            ));
        }
        Ok(())
    }

    /// Band a score. Monotone: a higher score never gets a lower label.
    pub fn label(&self, score: f64) -> KeyLabel {
        if score >= self.perfect {
            KeyLabel::Perfect
        } else if score >= self.excellent {
            KeyLabel::Excellent
        } else if score >= self.good {
            KeyLabel::Good
        } else if score >= self.weak {
            KeyLabel::Weak
        } else {
            KeyLabel::None
        }
    }
}

/// The best key hypothesis for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryKeyCandidate {
    pub table: String,
    pub columns: Vec<String>,
    /// 0 to 100.
    pub score: f64,
    pub label: KeyLabel,
    /// True when the score rests on the independence approximation.
    #[serde(default)]
    pub estimated: bool,
    /// Agreement with the catalog's declared key, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches_declared: Option<bool>,
}

impl PrimaryKeyCandidate {
    /// The key column when the candidate is a single column.
    pub fn single_column(&self) -> Option<&str> {
        match self.columns.as_slice() {
            [column] => Some(column.as_str()),
            _ => None,
        }
    }
}

/// Winners for every table of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyScoringOutcome {
    /// One candidate per table, ordered by table.
    pub candidates: Vec<PrimaryKeyCandidate>,
    /// Tables with no column scoring above NONE, or with no data at all.
    pub tables_without_key: Vec<String>,
}

impl KeyScoringOutcome {
    pub fn winner(&self, table: &str) -> Option<&PrimaryKeyCandidate> {
        self.candidates
            .binary_search_by(|c| c.table.as_str().cmp(table))
            .ok()
            .map(|idx| &self.candidates[idx])
    }
}

#[derive(Debug, Clone)]
struct Ranked<'a> {
    columns: Vec<&'a str>,
    score: f64,
    identifier: bool,
    indexed: bool,
}

fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

fn compare_ranked(a: &Ranked<'_>, b: &Ranked<'_>) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.columns.len().cmp(&b.columns.len()))
        .then_with(|| b.identifier.cmp(&a.identifier))
        .then_with(|| b.indexed.cmp(&a.indexed))
        .then_with(|| a.columns.cmp(&b.columns))
}

/// Scores key candidates from column statistics.
#[derive(Debug, Clone, Default)]
pub struct PrimaryKeyScorer {
    config: KeyScoringConfig,
}

impl PrimaryKeyScorer {
    pub fn new(config: KeyScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KeyScoringConfig {
        &self.config
    }

    /// Single-column key score in `[0, 100]`.
    pub fn score_column(&self, stats: &ColumnStats) -> f64 {
        round_score(100.0 * stats.distinct_fraction * (1.0 - stats.null_fraction))
    }

    /// Best candidate for one table, or `None` when nothing scores above NONE.
    pub fn score_table(&self, snapshot: &StatisticsSnapshot, table: &str) -> Option<PrimaryKeyCandidate> {
        let table_stats = snapshot.table(table)?;
        if table_stats.row_count == 0 {
            return None;
        }

        let mut singles: Vec<Ranked<'_>> = snapshot
            .columns(table)
            .map(|(name, stats)| Ranked {
                columns: vec![name],
                score: self.score_column(stats),
                identifier: is_identifier_name(name),
                indexed: stats.is_indexed,
            })
            .collect();
        singles.sort_by(compare_ranked);

        let mut best = singles.into_iter().next()?;
        let mut estimated = false;

        if self.config.composite_search && best.score < self.config.good {
            if let Some(composite) = self.best_composite(snapshot, table) {
                if composite.score > best.score {
                    best = composite;
                    estimated = true;
                }
            }
        }

        let label = self.config.label(best.score);
        if label == KeyLabel::None {
            return None;
        }

        let columns: Vec<String> = best.columns.iter().map(|c| c.to_string()).collect();
        let matches_declared = table_stats
            .declared_primary_key
            .as_ref()
            .map(|declared| same_column_set(declared, &columns));

        Some(PrimaryKeyCandidate {
            table: table.to_string(),
            columns,
            score: best.score,
            label,
            estimated,
            matches_declared,
        })
    }

    fn best_composite<'a>(
        &self,
        snapshot: &'a StatisticsSnapshot,
        table: &str,
    ) -> Option<Ranked<'a>> {
        let eligible: Vec<(&str, &ColumnStats)> = snapshot
            .columns(table)
            .filter(|(_, stats)| stats.distinct_fraction >= self.config.composite_min_distinct)
            .collect();

        let mut pairs = Vec::new();
        for (i, (name_a, a)) in eligible.iter().enumerate() {
            for (name_b, b) in &eligible[i + 1..] {
                let joint = (a.distinct_fraction * b.distinct_fraction).min(1.0);
                let completeness = (1.0 - a.null_fraction) * (1.0 - b.null_fraction);
                pairs.push(Ranked {
                    columns: vec![*name_a, *name_b],
                    score: round_score(100.0 * joint * completeness),
                    identifier: is_identifier_name(name_a) || is_identifier_name(name_b),
                    indexed: a.is_indexed && b.is_indexed,
                });
            }
        }

        pairs.sort_by(compare_ranked);
        pairs.into_iter().next()
    }

    /// Score every table of the snapshot.
    pub fn score_snapshot(&self, snapshot: &StatisticsSnapshot) -> KeyScoringOutcome {
        let mut outcome = KeyScoringOutcome::default();

        for (table, _) in snapshot.tables() {
            match self.score_table(snapshot, table) {
                Some(candidate) => outcome.candidates.push(candidate),
                None => outcome.tables_without_key.push(table.to_string()),
            }
        }

        outcome
    }
}

fn same_column_set(declared: &[String], inferred: &[String]) -> bool {
    let mut a: Vec<String> = declared.iter().map(|c| c.to_lowercase()).collect();
    let mut b: Vec<String> = inferred.iter().map(|c| c.to_lowercase()).collect();
    a.sort();
    b.sort();
    a == b
}
