//! Catalog providers: where snapshots and sampled rows come from.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │   Orchestrator / pipeline    │
//! └──────────────────────────────┘
//!                │  get_snapshot / get_sample_rows
//!                ▼
//! ┌──────────────────────────────┐
//! │   dyn CatalogProvider        │
//! │   ├── MemoryCatalogProvider  │  in-process, embedders and tests
//! │   └── JsonCatalogProvider    │  <dir>/<environment>.json exports
//! └──────────────────────────────┘
//! ```

mod error;
mod json;
mod memory;
mod provider;

pub use error::{CatalogError, CatalogResult};
pub use json::{CatalogExport, JsonCatalogProvider};
pub use memory::MemoryCatalogProvider;
pub use provider::CatalogProvider;
