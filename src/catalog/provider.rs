//! CatalogProvider trait definition.
//!
//! A catalog provider is the only thing in relic that touches a database or
//! an export of one. It hands the engine a validated [`StatisticsSnapshot`]
//! and, on request, sampled rows. Everything downstream is pure.

use async_trait::async_trait;

use super::error::CatalogResult;
use crate::snapshot::{Row, StatisticsSnapshot};

/// Source of statistics snapshots and sampled rows, one per environment.
///
/// Implementations must be safe to call concurrently for different
/// environments. Each call is a suspension point of the orchestrator and a
/// cancellation boundary.
///
/// # Example
///
/// ```ignore
/// use relic::catalog::CatalogProvider;
///
/// async fn example(provider: &impl CatalogProvider) -> CatalogResult<()> {
///     let snapshot = provider.get_snapshot("staging").await?;
///     for (table, _) in snapshot.tables() {
///         let rows = provider.get_sample_rows("staging", table, 1000).await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Capture the statistics snapshot of an environment.
    async fn get_snapshot(&self, environment: &str) -> CatalogResult<StatisticsSnapshot>;

    /// Fetch up to `limit` sampled rows of a table.
    async fn get_sample_rows(
        &self,
        environment: &str,
        table: &str,
        limit: usize,
    ) -> CatalogResult<Vec<Row>>;
}
