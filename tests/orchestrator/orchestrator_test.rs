// tests/orchestrator/orchestrator_test.rs
mod common;

use common::{shop_provider, ScriptedProvider};
use relic::catalog::MemoryCatalogProvider;
use relic::config::{ConfigError, RunConfig};
use relic::inference::{CardinalityKind, Confidence, DuplicateSeverity, KeyLabel};
use relic::orchestrator::{run_inference, Orchestrator};
use relic::report::{InferenceReport, ReportStatus};
use relic::snapshot::{ColumnStats, SnapshotBuilder, TableStats};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_environment_is_isolated() {
    let provider = shop_provider(["dev", "qa"]).with_unreachable("prod", "connection refused");

    let results = run_inference(Arc::new(provider), ["dev", "qa", "prod"], RunConfig::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results.summary.succeeded, 2);
    assert_eq!(results.summary.failed, 1);
    assert!(results.get("dev").unwrap().status.is_success());
    assert!(results.get("qa").unwrap().status.is_success());

    match &results.get("prod").unwrap().status {
        ReportStatus::Failed { reason } => {
            assert!(reason.starts_with("snapshot unavailable"));
            assert!(reason.contains("connection refused"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_report_contents() {
    let results = run_inference(Arc::new(shop_provider(["dev"])), ["dev"], RunConfig::default())
        .await
        .unwrap();
    let report = results.get("dev").unwrap();

    assert_eq!(report.environment, "dev");
    assert_eq!(report.table_count, 4);
    assert!(report.snapshot_fingerprint.is_some());

    let customers = report.primary_keys.iter().find(|k| k.table == "customers").unwrap();
    assert_eq!(customers.columns, vec!["id"]);
    assert_eq!(customers.label, KeyLabel::Perfect);
    assert_eq!(report.primary_keys.len(), 4);

    assert_eq!(report.relationships.len(), 3);
    let orders = report
        .relationships
        .iter()
        .find(|e| e.foreign_key.source_table == "orders")
        .unwrap();
    assert_eq!(orders.foreign_key.target_table, "customers");
    assert_eq!(orders.foreign_key.match_fraction, 0.96);
    assert_eq!(orders.foreign_key.confidence, Confidence::High);
    assert_eq!(orders.kind, CardinalityKind::OneToMany);

    let bridged: Vec<_> = report
        .relationships
        .iter()
        .filter(|e| e.foreign_key.source_table == "order_items")
        .collect();
    assert_eq!(bridged.len(), 2);
    assert!(bridged.iter().all(|e| e.kind == CardinalityKind::ManyToMany && e.bridge.is_some()));

    assert_eq!(report.cardinality_summary.one_to_many, 1);
    assert_eq!(report.cardinality_summary.many_to_many, 2);

    assert_eq!(report.duplicates.len(), 4);
    let orders_dupes = report.duplicates.iter().find(|d| d.table == "orders").unwrap();
    assert_eq!(orders_dupes.sample_size, 10);
    assert_eq!(orders_dupes.severity, DuplicateSeverity::High);
    let items_dupes = report.duplicates.iter().find(|d| d.table == "order_items").unwrap();
    assert_eq!(items_dupes.severity, DuplicateSeverity::Unknown);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scale_cap_reports_partial() {
    let mut builder = SnapshotBuilder::new("warehouse");
    for i in 0..501 {
        let table = format!("stage_{:03}", i);
        builder = builder
            .table(table.as_str(), TableStats::new("staging", 10))
            .column(table.as_str(), "id", ColumnStats::new("integer", 1.0, 0.0));
    }
    let provider = MemoryCatalogProvider::new().with_snapshot(builder.build().unwrap());

    let results = run_inference(Arc::new(provider), ["warehouse"], RunConfig::default())
        .await
        .unwrap();
    let report = results.get("warehouse").unwrap();

    match &report.status {
        ReportStatus::Partial { reasons } => {
            assert_eq!(reasons.len(), 1);
            assert!(reasons[0].contains("501 tables exceed the limit of 500"));
        }
        other => panic!("expected partial, got {:?}", other),
    }
    assert!(report.similarity_degradation.is_some());
    assert_eq!(report.primary_keys.len(), 501);
    assert_eq!(results.summary.partial, 1);
}

fn without_timing(mut report: InferenceReport) -> InferenceReport {
    report.duration_ms = 0;
    report
}

#[tokio::test(flavor = "multi_thread")]
async fn test_runs_are_deterministic() {
    let provider = Arc::new(shop_provider(["a", "b", "c", "d"]));
    let orchestrator = Orchestrator::new(provider, RunConfig::default().with_max_workers(3)).unwrap();

    let first = orchestrator.run(["a", "b", "c", "d"]).await;
    let second = orchestrator.run(["d", "c", "b", "a"]).await;

    assert_ne!(first.run_id, second.run_id);
    let first: Vec<_> = first.environments.into_values().map(without_timing).collect();
    let second: Vec<_> = second.environments.into_values().map(without_timing).collect();
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_workers_bounded() {
    let environments = ["e1", "e2", "e3", "e4", "e5", "e6"];
    let mut provider = ScriptedProvider::new(shop_provider(environments));
    provider.snapshot_delay = Duration::from_millis(50);
    let provider = Arc::new(provider);

    let results = run_inference(
        Arc::clone(&provider),
        environments,
        RunConfig::default().with_max_workers(2),
    )
    .await
    .unwrap();

    assert_eq!(results.summary.succeeded, 6);
    assert!(provider.peak_concurrency() <= 2);
    assert!(provider.peak_concurrency() >= 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_deadline_keeps_completed_stages() {
    let provider = ScriptedProvider::new(shop_provider(["fast", "slow"]))
        .with_sample_delay("slow", Duration::from_secs(30));

    let config = RunConfig::default().with_timeout(Duration::from_millis(500));
    let results = run_inference(Arc::new(provider), ["fast", "slow"], config)
        .await
        .unwrap();

    assert!(results.get("fast").unwrap().status.is_success());

    let slow = results.get("slow").unwrap();
    match &slow.status {
        ReportStatus::Partial { reasons } => assert!(reasons[0].starts_with("deadline of 0.5s elapsed")),
        other => panic!("expected partial, got {:?}", other),
    }
    assert_eq!(slow.primary_keys.len(), 4);
    assert_eq!(slow.relationships.len(), 3);
    assert!(slow.duplicates.is_empty());
    assert!(results.summary.duration_ms < 30_000);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_panic_becomes_failure() {
    let mut provider = ScriptedProvider::new(shop_provider(["dev", "boom"]));
    provider.panic_on.insert("boom".to_string());

    let results = run_inference(Arc::new(provider), ["dev", "boom"], RunConfig::default())
        .await
        .unwrap();

    assert!(results.get("dev").unwrap().status.is_success());
    match &results.get("boom").unwrap().status {
        ReportStatus::Failed { reason } => {
            assert_eq!(reason, "analysis panicked: catalog driver crashed for boom");
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_sample_makes_partial() {
    let mut provider = ScriptedProvider::new(shop_provider(["dev"]));
    provider.failing_table = Some("orders".to_string());

    let results = run_inference(Arc::new(provider), ["dev"], RunConfig::default())
        .await
        .unwrap();
    let report = results.get("dev").unwrap();

    match &report.status {
        ReportStatus::Partial { reasons } => {
            assert_eq!(reasons.len(), 1);
            assert!(reasons[0].contains("'orders'"));
        }
        other => panic!("expected partial, got {:?}", other),
    }
    assert_eq!(report.duplicates.len(), 3);
    assert!(report.duplicates.iter().all(|d| d.table != "orders"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mislabelled_snapshot_fails() {
    let mut provider = ScriptedProvider::new(shop_provider(["dev"]));
    provider.mislabel = Some("dev".to_string());

    let results = run_inference(Arc::new(provider), ["dev"], RunConfig::default())
        .await
        .unwrap();

    match &results.get("dev").unwrap().status {
        ReportStatus::Failed { reason } => assert!(reason.starts_with("invalid snapshot")),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_config_rejected() {
    let provider = Arc::new(shop_provider(["dev"]));

    let err = run_inference(Arc::clone(&provider), ["dev"], RunConfig::default().with_timeout_secs(-1.0))
        .await
        .unwrap_err();
    assert_eq!(err, ConfigError::InvalidTimeout(-1.0));

    let err = run_inference(Arc::clone(&provider), ["dev"], RunConfig::default().with_timeout_secs(1e300))
        .await
        .unwrap_err();
    assert_eq!(err, ConfigError::InvalidTimeout(1e300));

    let err = run_inference(provider, ["dev"], RunConfig::default().with_min_fk_match(1.5))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::FractionOutOfRange { name: "min_fk_match", .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_result_set_serializes_by_environment() {
    let provider = shop_provider(["beta", "alpha"]).with_unreachable("gamma", "no route to host");
    let results = run_inference(Arc::new(provider), ["gamma", "beta", "alpha"], RunConfig::default())
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&results.to_json().unwrap()).unwrap();
    let keys: Vec<&String> = json["environments"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["alpha", "beta", "gamma"]);
    assert_eq!(json["environments"]["gamma"]["status"]["state"], "failed");
    assert_eq!(json["environments"]["alpha"]["status"]["state"], "success");
    assert_eq!(json["summary"]["total"], 3);
}
