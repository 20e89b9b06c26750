// tests/orchestrator/cancellation_test.rs
mod common;

use common::{shop_provider, ScriptedProvider};
use relic::config::RunConfig;
use relic::orchestrator::{CancellationSignal, Orchestrator};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn test_cancelled_before_start() {
    let signal = CancellationSignal::new();
    signal.cancel();

    let orchestrator = Orchestrator::new(Arc::new(shop_provider(["dev", "qa"])), RunConfig::default())
        .unwrap()
        .with_cancellation(signal);
    let results = orchestrator.run(["dev", "qa"]).await;

    assert_eq!(results.summary.cancelled, 2);
    let dev = results.get("dev").unwrap();
    assert!(dev.status.is_cancelled());
    assert!(dev.primary_keys.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_stops_at_next_catalog_call() {
    let provider = ScriptedProvider::new(shop_provider(["fast", "slow"]))
        .with_sample_delay("slow", Duration::from_millis(400));

    let orchestrator = Orchestrator::new(Arc::new(provider), RunConfig::default()).unwrap();
    let signal = orchestrator.cancellation();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        signal.cancel();
    });

    let results = orchestrator.run(["fast", "slow"]).await;

    // Finished before the signal.
    let fast = results.get("fast").unwrap();
    assert!(fast.status.is_success());
    assert_eq!(fast.duplicates.len(), 4);

    // Stopped after the in-flight sample call, keeping earlier stages.
    let slow = results.get("slow").unwrap();
    assert!(slow.status.is_cancelled());
    assert_eq!(slow.primary_keys.len(), 4);
    assert_eq!(slow.relationships.len(), 3);
    assert!(slow.duplicates.len() < 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_waiting_environments() {
    let mut provider = ScriptedProvider::new(shop_provider(["a", "b", "c"]));
    provider.snapshot_delay = Duration::from_millis(300);

    let orchestrator =
        Orchestrator::new(Arc::new(provider), RunConfig::default().with_max_workers(1)).unwrap();
    let signal = orchestrator.cancellation();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        signal.cancel();
    });

    let results = orchestrator.run(["a", "b", "c"]).await;
    assert_eq!(results.len(), 3);
    assert_eq!(results.summary.cancelled, 3);
}
