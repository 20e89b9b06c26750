//! Inference engine: one configured instance of every stage.

use serde::{Deserialize, Serialize};

use super::cardinality::{CardinalityClassifier, CardinalityConfig, CardinalityEdge};
use super::duplicates::{DuplicateConfig, DuplicateEstimate, DuplicateRowDetector};
use super::foreign_key::{ForeignKeyCandidate, ForeignKeyConfig, ForeignKeyMatcher};
use super::primary_key::{KeyScoringConfig, KeyScoringOutcome, PrimaryKeyScorer};
use super::profile::{ColumnFinding, ColumnProfiler, ProfileConfig};
use super::similarity::{SimilarityComparator, SimilarityConfig, SimilarityOutcome};
use crate::config::ConfigError;
use crate::snapshot::{Row, StatisticsSnapshot};

/// Configuration for every inference stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub primary_key: KeyScoringConfig,
    pub foreign_key: ForeignKeyConfig,
    pub cardinality: CardinalityConfig,
    pub similarity: SimilarityConfig,
    pub duplicates: DuplicateConfig,
    pub profile: ProfileConfig,
}

impl InferenceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.primary_key.validate()?;
        self.foreign_key.validate()?;
        self.cardinality.validate()?;
        self.similarity.validate()?;
        self.duplicates.validate()?;
        self.profile.validate()
    }

    /// Override the MEDIUM band floor. The LOW band shrinks and the HIGH bar
    /// rises when either would otherwise cross it.
    #[must_use]
    pub fn with_min_fk_match(mut self, min_match: f64) -> Self {
        self.foreign_key.min_match = min_match;
        if self.foreign_key.low_match > min_match {
            self.foreign_key.low_match = min_match;
        }
        if self.foreign_key.high_match < min_match {
            self.foreign_key.high_match = min_match;
        }
        self
    }

    #[must_use]
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity.threshold = threshold;
        self
    }
}

/// Runs the inference stages with a validated configuration.
#[derive(Debug, Clone, Default)]
pub struct InferenceEngine {
    keys: PrimaryKeyScorer,
    foreign_keys: ForeignKeyMatcher,
    cardinality: CardinalityClassifier,
    similarity: SimilarityComparator,
    duplicates: DuplicateRowDetector,
    profiler: ColumnProfiler,
}

impl InferenceEngine {
    pub fn new(config: InferenceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            keys: PrimaryKeyScorer::new(config.primary_key),
            foreign_keys: ForeignKeyMatcher::new(config.foreign_key),
            cardinality: CardinalityClassifier::new(config.cardinality),
            similarity: SimilarityComparator::new(config.similarity),
            duplicates: DuplicateRowDetector::new(config.duplicates),
            profiler: ColumnProfiler::new(config.profile),
        })
    }

    pub fn score_keys(&self, snapshot: &StatisticsSnapshot) -> KeyScoringOutcome {
        self.keys.score_snapshot(snapshot)
    }

    pub fn match_foreign_keys(
        &self,
        snapshot: &StatisticsSnapshot,
        keys: &KeyScoringOutcome,
    ) -> Vec<ForeignKeyCandidate> {
        self.foreign_keys.match_snapshot(snapshot, keys)
    }

    pub fn classify_cardinality(
        &self,
        snapshot: &StatisticsSnapshot,
        candidates: &[ForeignKeyCandidate],
    ) -> Vec<CardinalityEdge> {
        self.cardinality.classify_all(snapshot, candidates)
    }

    pub fn compare_tables(&self, snapshot: &StatisticsSnapshot) -> SimilarityOutcome {
        self.similarity.compare_snapshot(snapshot)
    }

    pub fn profile_columns(&self, snapshot: &StatisticsSnapshot) -> Vec<ColumnFinding> {
        self.profiler.profile(snapshot)
    }

    pub fn estimate_duplicates(&self, table: &str, rows: &[Row]) -> DuplicateEstimate {
        self.duplicates.estimate(table, rows)
    }

    /// Rows to request per table for duplicate estimation.
    pub fn duplicate_sample_limit(&self) -> usize {
        self.duplicates.sample_limit()
    }
}
