//! # Relic
//!
//! Recovers primary keys, foreign keys, cardinality, redundant tables and
//! duplicate rows from the statistics of undocumented relational schemas,
//! across many environments at once.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            CatalogProvider (memory, JSON export)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [get_snapshot, get_sample_rows]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  StatisticsSnapshot                      │
//! │     (row counts, distinct/null fractions, samples)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [inference]
//! ┌─────────────────────────────────────────────────────────┐
//! │   keys → foreign keys → cardinality, similarity,         │
//! │   column profile, duplicate rows                         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [orchestrator, one task per environment]
//! ┌─────────────────────────────────────────────────────────┐
//! │            ResultSet (environment → report)              │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod inference;
pub mod orchestrator;
pub mod report;
pub mod snapshot;

pub use catalog::{CatalogError, CatalogProvider, JsonCatalogProvider, MemoryCatalogProvider};
pub use config::{ConfigError, RunConfig, Settings};
pub use inference::{InferenceConfig, InferenceEngine};
pub use orchestrator::{run_inference, CancellationSignal, Orchestrator};
pub use report::{InferenceReport, ReportStatus, ResultSet, RunSummary};
pub use snapshot::{ColumnStats, SnapshotBuilder, StatisticsSnapshot, TableStats, Value};
