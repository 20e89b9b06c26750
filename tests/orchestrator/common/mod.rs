// tests/orchestrator/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use relic::catalog::{CatalogError, CatalogProvider, CatalogResult, MemoryCatalogProvider};
use relic::snapshot::{ColumnStats, Row, SnapshotBuilder, StatisticsSnapshot, TableStats, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn ids(range: std::ops::Range<i64>) -> ColumnStats {
    ColumnStats::new("integer", 1.0, 0.0).with_samples(range)
}

/// customers ← orders, and order_items bridging orders and products.
pub fn shop(environment: &str) -> StatisticsSnapshot {
    SnapshotBuilder::new(environment)
        .table("customers", TableStats::new("sales", 100))
        .column("customers", "id", ids(1..101))
        .column("customers", "email", ColumnStats::new("varchar", 1.0, 0.0))
        .table("orders", TableStats::new("sales", 200))
        .column("orders", "id", ids(1_001..1_201))
        .column(
            "orders",
            "customer_id",
            ColumnStats::new("integer", 0.25, 0.0).with_samples((1..=48_i64).chain(9_001..9_003)),
        )
        .table("products", TableStats::new("sales", 100))
        .column("products", "id", ids(20_001..20_101))
        .table("order_items", TableStats::new("sales", 1_000))
        .column("order_items", "id", ids(50_001..50_101))
        .column(
            "order_items",
            "order_id",
            ColumnStats::new("integer", 0.2, 0.0).with_samples(1_001..1_051_i64),
        )
        .column(
            "order_items",
            "product_id",
            ColumnStats::new("integer", 0.1, 0.0).with_samples(20_001..20_031_i64),
        )
        .build()
        .unwrap()
}

/// Ten order rows, two of them exact copies.
pub fn order_rows() -> Vec<Row> {
    let mut rows: Vec<Row> = (0..8)
        .map(|i| vec![Value::Int(1_001 + i), Value::Int(1 + i)])
        .collect();
    rows.push(rows[0].clone());
    rows.push(rows[0].clone());
    rows
}

pub fn shop_provider<'a>(environments: impl IntoIterator<Item = &'a str>) -> MemoryCatalogProvider {
    environments
        .into_iter()
        .fold(MemoryCatalogProvider::new(), |provider, env| {
            provider
                .with_snapshot(shop(env))
                .with_rows(env, "orders", order_rows())
        })
}

/// Wraps a memory provider with configurable misbehaviour.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    pub inner: MemoryCatalogProvider,
    /// Delay before every snapshot.
    pub snapshot_delay: Duration,
    /// Per-environment delay before every sample fetch.
    pub sample_delay: HashMap<String, Duration>,
    /// Environments whose snapshot call panics.
    pub panic_on: HashSet<String>,
    /// Table whose sample fetch always fails.
    pub failing_table: Option<String>,
    /// Environment whose snapshot is served under another name.
    pub mislabel: Option<String>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(inner: MemoryCatalogProvider) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn with_sample_delay(mut self, environment: &str, delay: Duration) -> Self {
        self.sample_delay.insert(environment.to_string(), delay);
        self
    }

    /// Highest number of concurrent snapshot calls observed.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogProvider for ScriptedProvider {
    async fn get_snapshot(&self, environment: &str) -> CatalogResult<StatisticsSnapshot> {
        if self.panic_on.contains(environment) {
            panic!("catalog driver crashed for {}", environment);
        }
        if self.mislabel.as_deref() == Some(environment) {
            return Ok(shop("somewhere_else"));
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(self.snapshot_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.inner.get_snapshot(environment).await
    }

    async fn get_sample_rows(
        &self,
        environment: &str,
        table: &str,
        limit: usize,
    ) -> CatalogResult<Vec<Row>> {
        if let Some(delay) = self.sample_delay.get(environment) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_table.as_deref() == Some(table) {
            return Err(CatalogError::query(environment, "sampling timed out"));
        }
        self.inner.get_sample_rows(environment, table, limit).await
    }
}
