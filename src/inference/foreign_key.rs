//! Foreign key candidate matching.
//!
//! Every column is tested against every single-column key winner by sample
//! containment:
//!
//! ```text
//! match_fraction = |distinct(C) ∩ distinct(P)| / |distinct(C)|
//! ```
//!
//! The fraction is then banded, with naming used only to admit the weaker
//! bands:
//!
//! | match fraction          | naming needed | confidence |
//! |-------------------------|---------------|------------|
//! | `>= high_match`         | none          | HIGH       |
//! | `[min_match, high)`     | loose         | MEDIUM     |
//! | `[low_match, min_match)`| strong        | LOW        |
//!
//! Anything else is discarded. Samples are bounded, so a fraction is an
//! estimate of containment in the sampled values, not a referential check.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use super::naming::{name_affinity, NameAffinity};
use super::primary_key::KeyScoringOutcome;
use super::thresholds::foreign_key as defaults;
use super::types::types_compatible;
use crate::config::{check_fraction, ConfigError};
use crate::snapshot::{ColumnStats, StatisticsSnapshot, Value};

/// Confidence band of a foreign key candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignKeyConfig {
    /// Floor of the MEDIUM band.
    pub min_match: f64,
    /// Floor of the HIGH band.
    pub high_match: f64,
    /// Floor of the LOW band (strong naming only).
    pub low_match: f64,
    /// Fewer shared sample values than this is not evidence.
    pub min_sample_overlap: usize,
}

impl Default for ForeignKeyConfig {
    fn default() -> Self {
        Self {
            min_match: defaults::MIN_MATCH,
            high_match: defaults::HIGH_MATCH,
            low_match: defaults::LOW_MATCH,
            min_sample_overlap: defaults::MIN_SAMPLE_OVERLAP,
        }
    }
}

impl ForeignKeyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("foreign_key.min_match", self.min_match)?;
        check_fraction("foreign_key.high_match", self.high_match)?;
        check_fraction("foreign_key.low_match", self.low_match)?;
        if self.min_sample_overlap == 0 {
            return Err(ConfigError::ZeroLimit("foreign_key.min_sample_overlap"));
        }
        if !(self.low_match <= self.min_match && self.min_match <= self.high_match) {
            return Err(ConfigError::ThresholdOrder(
                "foreign_key bands must satisfy low_match <= min_match <= high_match".into(),
            ));
        }
        Ok(())
    }
}

/// An inferred reference from `source_table.source_column` to a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyCandidate {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    pub match_fraction: f64,
    pub confidence: Confidence,
    pub affinity: NameAffinity,
    /// Number of distinct source sample values found among the target's.
    pub sample_overlap: usize,
    #[serde(default)]
    pub self_reference: bool,
    /// Another target ties on the top match fraction for the same column.
    #[serde(default)]
    pub ambiguous: bool,
}

struct Target<'a> {
    table: &'a str,
    column: &'a str,
    stats: &'a ColumnStats,
    samples: HashSet<&'a Value>,
}

/// Matches columns against key winners.
#[derive(Debug, Clone, Default)]
pub struct ForeignKeyMatcher {
    config: ForeignKeyConfig,
}

impl ForeignKeyMatcher {
    pub fn new(config: ForeignKeyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForeignKeyConfig {
        &self.config
    }

    /// Band a match fraction given the naming affinity.
    pub fn classify(&self, match_fraction: f64, affinity: NameAffinity) -> Option<Confidence> {
        if match_fraction >= self.config.high_match {
            Some(Confidence::High)
        } else if match_fraction >= self.config.min_match {
            (affinity >= NameAffinity::Loose).then_some(Confidence::Medium)
        } else if match_fraction >= self.config.low_match {
            (affinity == NameAffinity::Strong).then_some(Confidence::Low)
        } else {
            None
        }
    }

    /// All candidates in the snapshot, ordered by match fraction descending.
    pub fn match_snapshot(
        &self,
        snapshot: &StatisticsSnapshot,
        keys: &KeyScoringOutcome,
    ) -> Vec<ForeignKeyCandidate> {
        let targets: Vec<Target<'_>> = keys
            .candidates
            .iter()
            .filter_map(|pk| {
                let column = pk.single_column()?;
                let stats = snapshot.column(&pk.table, column)?;
                Some(Target {
                    table: pk.table.as_str(),
                    column,
                    stats,
                    samples: stats.distinct_samples(),
                })
            })
            .collect();

        let mut candidates = Vec::new();
        if targets.is_empty() {
            return candidates;
        }

        for (table, _) in snapshot.tables() {
            let own_key = keys.winner(table).and_then(|pk| pk.single_column());

            for (column, stats) in snapshot.columns(table) {
                let samples = stats.distinct_samples();
                if samples.is_empty() {
                    continue;
                }

                for target in &targets {
                    if target.table == table && target.column == column {
                        continue;
                    }
                    if let Some(candidate) =
                        self.evaluate(table, column, stats, &samples, own_key == Some(column), target)
                    {
                        candidates.push(candidate);
                    }
                }
            }
        }

        mark_ambiguous(&mut candidates);
        candidates.sort_by(compare_candidates);
        candidates
    }

    fn evaluate(
        &self,
        table: &str,
        column: &str,
        stats: &ColumnStats,
        samples: &HashSet<&Value>,
        is_own_key: bool,
        target: &Target<'_>,
    ) -> Option<ForeignKeyCandidate> {
        if !types_compatible(&stats.data_type, &target.stats.data_type) {
            return None;
        }

        let overlap = samples.iter().filter(|v| target.samples.contains(*v)).count();
        if overlap < self.config.min_sample_overlap {
            return None;
        }

        let affinity = name_affinity(column, target.table, target.column);
        // A table's own key points elsewhere only when its name says so.
        if is_own_key && affinity < NameAffinity::Strong {
            return None;
        }

        let match_fraction = overlap as f64 / samples.len() as f64;
        let confidence = self.classify(match_fraction, affinity)?;

        Some(ForeignKeyCandidate {
            source_table: table.to_string(),
            source_column: column.to_string(),
            target_table: target.table.to_string(),
            target_column: target.column.to_string(),
            match_fraction,
            confidence,
            affinity,
            sample_overlap: overlap,
            self_reference: target.table == table,
            ambiguous: false,
        })
    }
}

fn mark_ambiguous(candidates: &mut [ForeignKeyCandidate]) {
    let mut best: BTreeMap<(&str, &str), (f64, usize)> = BTreeMap::new();
    for c in candidates.iter() {
        let entry = best
            .entry((c.source_table.as_str(), c.source_column.as_str()))
            .or_insert((c.match_fraction, 0));
        if c.match_fraction > entry.0 {
            *entry = (c.match_fraction, 1);
        } else if c.match_fraction == entry.0 {
            entry.1 += 1;
        }
    }

    let ambiguous: HashSet<(String, String, u64)> = best
        .into_iter()
        .filter(|(_, (_, count))| *count > 1)
        .map(|((t, c), (fraction, _))| (t.to_string(), c.to_string(), fraction.to_bits()))
        .collect();

    for c in candidates.iter_mut() {
        let key = (c.source_table.clone(), c.source_column.clone(), c.match_fraction.to_bits());
        c.ambiguous = ambiguous.contains(&key);
    }
}

fn compare_candidates(a: &ForeignKeyCandidate, b: &ForeignKeyCandidate) -> Ordering {
    b.match_fraction
        .partial_cmp(&a.match_fraction)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.source_table.cmp(&b.source_table))
        .then_with(|| a.source_column.cmp(&b.source_column))
        .then_with(|| a.target_table.cmp(&b.target_table))
        .then_with(|| a.target_column.cmp(&b.target_column))
}
