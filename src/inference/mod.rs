//! Relationship inference from column statistics.
//!
//! Every stage here is a pure function of a [`StatisticsSnapshot`] (plus,
//! for duplicates, sampled rows). No stage talks to a database.
//!
//! # Architecture
//!
//! ```text
//!  StatisticsSnapshot
//!         │
//!         ├──▶ PrimaryKeyScorer ──▶ ForeignKeyMatcher ──▶ CardinalityClassifier
//!         │        (winners)          (candidates)            (edges, bridges)
//!         │
//!         ├──▶ SimilarityComparator   (redundant table pairs)
//!         ├──▶ ColumnProfiler         (null / constant columns)
//!         └──▶ DuplicateRowDetector   (needs sampled rows)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use relic::inference::{InferenceConfig, InferenceEngine};
//!
//! let engine = InferenceEngine::new(InferenceConfig::default())?;
//! let keys = engine.score_keys(&snapshot);
//! let fks = engine.match_foreign_keys(&snapshot, &keys);
//! let edges = engine.classify_cardinality(&snapshot, &fks);
//! ```

pub mod cardinality;
pub mod duplicates;
mod engine;
pub mod foreign_key;
pub mod naming;
pub mod primary_key;
pub mod profile;
pub mod similarity;
pub mod types;

pub use cardinality::{
    BridgeLink, CardinalityClassifier, CardinalityConfig, CardinalityEdge, CardinalityKind,
    CardinalitySummary,
};
pub use duplicates::{
    DuplicateConfig, DuplicateEstimate, DuplicateRowDetector, DuplicateSeverity, EstimateBasis,
};
pub use engine::{InferenceConfig, InferenceEngine};
pub use foreign_key::{Confidence, ForeignKeyCandidate, ForeignKeyConfig, ForeignKeyMatcher};
pub use naming::NameAffinity;
pub use primary_key::{
    KeyLabel, KeyScoringConfig, KeyScoringOutcome, PrimaryKeyCandidate, PrimaryKeyScorer,
};
pub use profile::{ColumnFinding, ColumnProfiler, FindingKind, ProfileConfig};
pub use similarity::{
    Recommendation, ScaleStrategy, SimilarityComparator, SimilarityConfig, SimilarityDegradation,
    SimilarityOutcome, SimilarityPair,
};

/// Default thresholds.
///
/// These are policy values, not derived constants. Each is exposed through
/// the matching config struct so it can be recalibrated per run.
pub mod thresholds {
    /// Primary key score bands (0 to 100).
    pub mod key {
        pub const PERFECT: f64 = 99.0;
        pub const EXCELLENT: f64 = 95.0;
        pub const GOOD: f64 = 85.0;
        pub const WEAK: f64 = 50.0;
        /// Columns below this distinct fraction never join a composite key.
        pub const COMPOSITE_MIN_DISTINCT: f64 = 0.5;
    }

    /// Foreign key match fraction bands.
    pub mod foreign_key {
        pub const HIGH_MATCH: f64 = 0.9;
        pub const MIN_MATCH: f64 = 0.7;
        /// LOW band floor, only reachable with strong naming.
        pub const LOW_MATCH: f64 = 0.6;
        pub const MIN_SAMPLE_OVERLAP: usize = 3;
    }

    pub mod cardinality {
        /// Distinct fraction treated as unique.
        pub const UNIQUE: f64 = 0.98;
        /// "An order of magnitude".
        pub const BRIDGE_ROW_RATIO: f64 = 10.0;
    }

    pub mod similarity {
        pub const THRESHOLD: f64 = 0.7;
        pub const MAX_TABLES: usize = 500;
        pub const CONSOLIDATE: f64 = 0.95;
        pub const REVIEW: f64 = 0.85;
        pub const UTILITY_COLUMNS: &[&str] = &[
            "id",
            "created_at",
            "updated_at",
            "deleted_at",
            "created_by",
            "updated_by",
            "modified_at",
            "modified_by",
            "version",
        ];
    }

    pub mod duplicates {
        pub const SAMPLE_LIMIT: usize = 1000;
        pub const HIGH_SEVERITY: f64 = 0.10;
    }

    pub mod profile {
        pub const MOSTLY_NULL: f64 = 0.9;
        pub const HIGH_NULL_RATE: f64 = 0.5;
    }
}
