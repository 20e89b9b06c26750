//! Catalog provider backed by JSON exports on disk.
//!
//! Each environment is one file, `<dir>/<environment>.json`:
//!
//! ```json
//! {
//!   "snapshot": {
//!     "environment": "staging",
//!     "tables": { "users": { "schema_name": "public", "row_count": 3 } },
//!     "columns": { "users": { "id": { "data_type": "integer", "null_fraction": 0.0,
//!                                      "distinct_fraction": 1.0, "sample_values": [1, 2, 3] } } }
//!   },
//!   "sample_rows": { "users": [[1], [2], [3]] }
//! }
//! ```
//!
//! `get_snapshot` always reads the file and keeps the parsed export for that
//! environment; `get_sample_rows` serves tables from it, so an export is
//! parsed once per environment per run rather than once per table. The next
//! `get_snapshot` for the environment replaces the cached export.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::{CatalogError, CatalogResult};
use super::provider::CatalogProvider;
use crate::snapshot::{Row, StatisticsSnapshot};

/// On-disk layout of one environment export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogExport {
    pub snapshot: StatisticsSnapshot,
    #[serde(default)]
    pub sample_rows: BTreeMap<String, Vec<Row>>,
}

#[derive(Debug, Clone)]
pub struct JsonCatalogProvider {
    root: PathBuf,
    exports: DashMap<String, Arc<CatalogExport>>,
}

impl JsonCatalogProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exports: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn export_path(&self, environment: &str) -> PathBuf {
        self.root.join(format!("{}.json", environment))
    }

    /// Environment names of every `*.json` export in the directory, sorted.
    pub async fn discover(&self) -> CatalogResult<Vec<String>> {
        let mut environments = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                environments.push(stem.to_string());
            }
        }
        environments.sort();
        Ok(environments)
    }

    async fn load(&self, environment: &str) -> CatalogResult<CatalogExport> {
        let content = match tokio::fs::read_to_string(self.export_path(environment)).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(CatalogError::UnknownEnvironment(environment.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let export: CatalogExport = serde_json::from_str(&content)?;
        if export.snapshot.environment() != environment {
            return Err(CatalogError::query(
                environment,
                format!(
                    "export contains a snapshot of '{}'",
                    export.snapshot.environment()
                ),
            ));
        }
        Ok(export)
    }

    /// Parsed export of an environment, read from disk only on a cache miss.
    async fn cached(&self, environment: &str) -> CatalogResult<Arc<CatalogExport>> {
        let hit = self.exports.get(environment).map(|e| Arc::clone(e.value()));
        if let Some(export) = hit {
            return Ok(export);
        }
        let export = Arc::new(self.load(environment).await?);
        self.exports
            .insert(environment.to_string(), Arc::clone(&export));
        Ok(export)
    }

    /// Drop the parsed export of an environment.
    pub fn evict(&self, environment: &str) {
        self.exports.remove(environment);
    }
}

#[async_trait]
impl CatalogProvider for JsonCatalogProvider {
    async fn get_snapshot(&self, environment: &str) -> CatalogResult<StatisticsSnapshot> {
        self.evict(environment);
        let export = self.cached(environment).await?;
        Ok(export.snapshot.clone())
    }

    async fn get_sample_rows(
        &self,
        environment: &str,
        table: &str,
        limit: usize,
    ) -> CatalogResult<Vec<Row>> {
        let export = self.cached(environment).await?;
        if export.snapshot.table(table).is_none() {
            return Err(CatalogError::UnknownTable {
                environment: environment.to_string(),
                table: table.to_string(),
            });
        }
        Ok(export
            .sample_rows
            .get(table)
            .map(|rows| rows.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
