//! In-process catalog provider.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::error::{CatalogError, CatalogResult};
use super::provider::CatalogProvider;
use crate::snapshot::{Row, StatisticsSnapshot};

#[derive(Debug, Clone)]
enum Entry {
    Available {
        snapshot: StatisticsSnapshot,
        rows: BTreeMap<String, Vec<Row>>,
    },
    Unreachable(String),
}

/// Serves snapshots and sample rows held in memory.
///
/// Useful for embedding relic behind an existing extraction layer and for
/// tests. Environments can also be registered as unreachable to exercise
/// failure handling.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogProvider {
    environments: BTreeMap<String, Entry>,
}

impl MemoryCatalogProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a snapshot under its own environment name.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: StatisticsSnapshot) -> Self {
        self.environments.insert(
            snapshot.environment().to_string(),
            Entry::Available {
                snapshot,
                rows: BTreeMap::new(),
            },
        );
        self
    }

    /// Attach sampled rows to a table of a registered environment.
    #[must_use]
    pub fn with_rows(mut self, environment: &str, table: impl Into<String>, rows: Vec<Row>) -> Self {
        if let Some(Entry::Available { rows: tables, .. }) = self.environments.get_mut(environment) {
            tables.insert(table.into(), rows);
        }
        self
    }

    /// Register an environment whose connection always fails.
    #[must_use]
    pub fn with_unreachable(mut self, environment: impl Into<String>, message: impl Into<String>) -> Self {
        self.environments
            .insert(environment.into(), Entry::Unreachable(message.into()));
        self
    }

    /// Registered environments in lexical order.
    pub fn environments(&self) -> Vec<String> {
        self.environments.keys().cloned().collect()
    }
}

#[async_trait]
impl CatalogProvider for MemoryCatalogProvider {
    async fn get_snapshot(&self, environment: &str) -> CatalogResult<StatisticsSnapshot> {
        match self.environments.get(environment) {
            Some(Entry::Available { snapshot, .. }) => Ok(snapshot.clone()),
            Some(Entry::Unreachable(message)) => Err(CatalogError::connection(environment, message.as_str())),
            None => Err(CatalogError::UnknownEnvironment(environment.to_string())),
        }
    }

    async fn get_sample_rows(
        &self,
        environment: &str,
        table: &str,
        limit: usize,
    ) -> CatalogResult<Vec<Row>> {
        match self.environments.get(environment) {
            Some(Entry::Available { snapshot, rows }) => {
                if snapshot.table(table).is_none() {
                    return Err(CatalogError::UnknownTable {
                        environment: environment.to_string(),
                        table: table.to_string(),
                    });
                }
                Ok(rows
                    .get(table)
                    .map(|r| r.iter().take(limit).cloned().collect())
                    .unwrap_or_default())
            }
            Some(Entry::Unreachable(message)) => Err(CatalogError::connection(environment, message.as_str())),
            None => Err(CatalogError::UnknownEnvironment(environment.to_string())),
        }
    }
}
