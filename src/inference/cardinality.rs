//! Relationship cardinality.
//!
//! Each foreign key candidate is classified from the distinctness of its two
//! ends:
//!
//! ```text
//! source distinct   target unique   kind
//! ---------------   -------------   ------------
//! all NULL          -               INDETERMINATE
//! >= 0.98           yes             ONE_TO_ONE
//! <  0.98           yes             ONE_TO_MANY
//! any               no              MANY_TO_MANY
//! ```
//!
//! On top of that, a table whose columns reference two or more other tables
//! and which is not an order of magnitude smaller than any of them is taken
//! to be a bridge (junction) table. All of its outgoing edges become
//! MANY_TO_MANY and carry a [`BridgeLink`]. This is a structural heuristic:
//! a wide fact table can look like a bridge and a sparse bridge can be
//! missed.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::foreign_key::ForeignKeyCandidate;
use super::thresholds::cardinality as defaults;
use crate::config::{check_fraction, ConfigError};
use crate::snapshot::StatisticsSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardinalityKind {
    OneToOne,
    OneToMany,
    ManyToMany,
    Indeterminate,
}

impl fmt::Display for CardinalityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneToOne => write!(f, "1:1"),
            Self::OneToMany => write!(f, "1:N"),
            Self::ManyToMany => write!(f, "N:M"),
            Self::Indeterminate => write!(f, "?"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardinalityConfig {
    /// Distinct fraction at which a column counts as unique.
    pub unique_threshold: f64,
    /// A bridge may be at most this many times smaller than a linked table.
    pub bridge_row_ratio: f64,
}

impl Default for CardinalityConfig {
    fn default() -> Self {
        Self {
            unique_threshold: defaults::UNIQUE,
            bridge_row_ratio: defaults::BRIDGE_ROW_RATIO,
        }
    }
}

impl CardinalityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("cardinality.unique_threshold", self.unique_threshold)?;
        if !(self.bridge_row_ratio.is_finite() && self.bridge_row_ratio >= 1.0) {
            return Err(ConfigError::InvalidValue {
                name: "cardinality.bridge_row_ratio",
                reason: format!("must be a finite number >= 1, got {}", self.bridge_row_ratio),
            });
        }
        Ok(())
    }
}

/// Marks an edge as one leg of a many-to-many link through a bridge table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeLink {
    pub bridge_table: String,
    /// Every table the bridge connects, in lexical order.
    pub linked_tables: Vec<String>,
}

/// A foreign key candidate with its classified cardinality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardinalityEdge {
    pub foreign_key: ForeignKeyCandidate,
    pub kind: CardinalityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeLink>,
    /// Average source rows per distinct source value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_fan_out: Option<f64>,
}

/// Counts per kind. Indeterminate edges are kept out of the classified total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardinalitySummary {
    pub one_to_one: usize,
    pub one_to_many: usize,
    pub many_to_many: usize,
    pub indeterminate: usize,
}

impl CardinalitySummary {
    pub fn from_edges(edges: &[CardinalityEdge]) -> Self {
        let mut summary = Self::default();
        for edge in edges {
            match edge.kind {
                CardinalityKind::OneToOne => summary.one_to_one += 1,
                CardinalityKind::OneToMany => summary.one_to_many += 1,
                CardinalityKind::ManyToMany => summary.many_to_many += 1,
                CardinalityKind::Indeterminate => summary.indeterminate += 1,
            }
        }
        summary
    }

    /// Edges with a determinate kind.
    pub fn classified(&self) -> usize {
        self.one_to_one + self.one_to_many + self.many_to_many
    }
}

impl fmt::Display for CardinalitySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "1:1={} 1:N={} N:M={} (indeterminate: {})",
            self.one_to_one, self.one_to_many, self.many_to_many, self.indeterminate
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct CardinalityClassifier {
    config: CardinalityConfig,
}

impl CardinalityClassifier {
    pub fn new(config: CardinalityConfig) -> Self {
        Self { config }
    }

    /// Kind of a single edge, ignoring bridge structure.
    pub fn classify(&self, snapshot: &StatisticsSnapshot, fk: &ForeignKeyCandidate) -> CardinalityKind {
        let source_rows = snapshot.table(&fk.source_table).map_or(0, |t| t.row_count);
        let Some(source) = snapshot.column(&fk.source_table, &fk.source_column) else {
            return CardinalityKind::Indeterminate;
        };
        if source_rows == 0 || source.is_all_null() {
            return CardinalityKind::Indeterminate;
        }

        let target_unique = snapshot
            .column(&fk.target_table, &fk.target_column)
            .is_some_and(|t| t.distinct_fraction >= self.config.unique_threshold);

        match (source.distinct_fraction >= self.config.unique_threshold, target_unique) {
            (true, true) => CardinalityKind::OneToOne,
            (false, true) => CardinalityKind::OneToMany,
            (_, false) => CardinalityKind::ManyToMany,
        }
    }

    /// Bridge tables mapped to the tables they link.
    pub fn detect_bridges(
        &self,
        snapshot: &StatisticsSnapshot,
        candidates: &[ForeignKeyCandidate],
    ) -> BTreeMap<String, BTreeSet<String>> {
        let mut outgoing: BTreeMap<&str, Vec<&ForeignKeyCandidate>> = BTreeMap::new();
        for fk in candidates.iter().filter(|fk| !fk.self_reference) {
            outgoing.entry(fk.source_table.as_str()).or_default().push(fk);
        }

        let mut bridges = BTreeMap::new();
        for (table, edges) in outgoing {
            let rows = snapshot.table(table).map_or(0, |t| t.row_count) as f64;
            let comparable: Vec<&ForeignKeyCandidate> = edges
                .into_iter()
                .filter(|fk| {
                    let target_rows = snapshot.table(&fk.target_table).map_or(0, |t| t.row_count);
                    rows * self.config.bridge_row_ratio >= target_rows as f64
                })
                .collect();

            let mut linked = BTreeSet::new();
            for (i, a) in comparable.iter().enumerate() {
                for b in &comparable[i + 1..] {
                    if a.source_column != b.source_column && a.target_table != b.target_table {
                        linked.insert(a.target_table.clone());
                        linked.insert(b.target_table.clone());
                    }
                }
            }

            if linked.len() >= 2 {
                bridges.insert(table.to_string(), linked);
            }
        }

        bridges
    }

    /// Classify every candidate, applying bridge detection.
    pub fn classify_all(
        &self,
        snapshot: &StatisticsSnapshot,
        candidates: &[ForeignKeyCandidate],
    ) -> Vec<CardinalityEdge> {
        let bridges = self.detect_bridges(snapshot, candidates);

        candidates
            .iter()
            .map(|fk| {
                let mut kind = self.classify(snapshot, fk);
                let bridge = bridges
                    .get(&fk.source_table)
                    .filter(|linked| linked.contains(&fk.target_table) && !fk.self_reference)
                    .map(|linked| BridgeLink {
                        bridge_table: fk.source_table.clone(),
                        linked_tables: linked.iter().cloned().collect(),
                    });
                if bridge.is_some() && kind != CardinalityKind::Indeterminate {
                    kind = CardinalityKind::ManyToMany;
                }

                CardinalityEdge {
                    foreign_key: fk.clone(),
                    kind,
                    bridge,
                    estimated_fan_out: self.fan_out(snapshot, fk),
                }
            })
            .collect()
    }

    fn fan_out(&self, snapshot: &StatisticsSnapshot, fk: &ForeignKeyCandidate) -> Option<f64> {
        let source = snapshot.column(&fk.source_table, &fk.source_column)?;
        if source.distinct_fraction <= 0.0 {
            return None;
        }
        let ratio = (1.0 - source.null_fraction) / source.distinct_fraction;
        Some((ratio * 100.0).round() / 100.0)
    }
}
