// tests/inference/primary_key_test.rs
use relic::inference::{KeyLabel, KeyScoringConfig, PrimaryKeyScorer};
use relic::snapshot::{ColumnStats, SnapshotBuilder, StatisticsSnapshot, TableStats};

fn users_snapshot() -> StatisticsSnapshot {
    SnapshotBuilder::new("dev")
        .table("users", TableStats::new("public", 1_000))
        .column("users", "id", ColumnStats::new("integer", 1.0, 0.0).indexed())
        .column("users", "email", ColumnStats::new("varchar", 1.0, 0.0))
        .column("users", "country", ColumnStats::new("varchar", 0.05, 0.0))
        .build()
        .unwrap()
}

#[test]
fn test_identifier_wins_tie_with_unique_email() {
    let outcome = PrimaryKeyScorer::default().score_snapshot(&users_snapshot());

    let users = outcome.winner("users").unwrap();
    assert_eq!(users.columns, vec!["id"]);
    assert_eq!(users.score, 100.0);
    assert_eq!(users.label, KeyLabel::Perfect);
    assert!(!users.estimated);
    assert_eq!(outcome.candidates.len(), 1);
    assert!(outcome.tables_without_key.is_empty());
}

#[test]
fn test_unique_id_beats_nearly_unique_email() {
    let snapshot = SnapshotBuilder::new("dev")
        .table("users", TableStats::new("public", 1_000))
        .column("users", "id", ColumnStats::new("integer", 1.0, 0.0))
        .column("users", "email", ColumnStats::new("varchar", 0.998, 0.001))
        .build()
        .unwrap();

    let scorer = PrimaryKeyScorer::default();
    let email = snapshot.column("users", "email").unwrap();
    assert_eq!(scorer.score_column(email), 99.7);

    let outcome = scorer.score_snapshot(&snapshot);
    assert_eq!(outcome.candidates.len(), 1);
    let users = outcome.winner("users").unwrap();
    assert_eq!(users.columns, vec!["id"]);
    assert_eq!(users.score, 100.0);
    assert_eq!(users.label, KeyLabel::Perfect);
}

#[test]
fn test_column_without_distinct_values_never_proposed() {
    let snapshot = SnapshotBuilder::new("dev")
        .table("flags", TableStats::new("public", 250))
        .column("flags", "flag_id", ColumnStats::new("integer", 0.0, 0.0))
        .build()
        .unwrap();

    let scorer = PrimaryKeyScorer::default();
    assert!(scorer.score_table(&snapshot, "flags").is_none());
    assert_eq!(scorer.score_snapshot(&snapshot).tables_without_key, vec!["flags"]);
}

#[test]
fn test_score_is_purely_statistical() {
    let scorer = PrimaryKeyScorer::default();
    let plain = ColumnStats::new("integer", 0.9, 0.0);
    let indexed = ColumnStats::new("integer", 0.9, 0.0).indexed();
    assert_eq!(scorer.score_column(&plain), scorer.score_column(&indexed));
    assert_eq!(scorer.score_column(&plain), 90.0);

    // 100 × 0.95 × 0.9
    let sparse = ColumnStats::new("integer", 0.95, 0.1);
    assert_eq!(scorer.score_column(&sparse), 85.5);
}

#[test]
fn test_indexed_breaks_tie_between_non_identifiers() {
    let snapshot = SnapshotBuilder::new("dev")
        .table("accounts", TableStats::new("public", 10))
        .column("accounts", "alias", ColumnStats::new("text", 1.0, 0.0))
        .column("accounts", "handle", ColumnStats::new("text", 1.0, 0.0).indexed())
        .build()
        .unwrap();

    let winner = PrimaryKeyScorer::default().score_table(&snapshot, "accounts").unwrap();
    assert_eq!(winner.columns, vec!["handle"]);
}

#[test]
fn test_composite_never_outscores_its_columns() {
    let snapshot = SnapshotBuilder::new("events")
        .table("events", TableStats::new("public", 1_000))
        .column("events", "kind", ColumnStats::new("text", 0.5, 0.0))
        .column("events", "region", ColumnStats::new("text", 0.5, 0.0))
        .build()
        .unwrap();

    // Joint fraction 0.5 × 0.5 scores 25, below either column alone.
    let winner = PrimaryKeyScorer::default().score_table(&snapshot, "events").unwrap();
    assert_eq!(winner.columns, vec!["kind"]);
    assert_eq!(winner.score, 50.0);
    assert_eq!(winner.label, KeyLabel::Weak);
    assert!(!winner.estimated);
}

#[test]
fn test_composite_search_keeps_best_single_column() {
    let snapshot = SnapshotBuilder::new("dev")
        .table("enrollments", TableStats::new("public", 1_000))
        .column("enrollments", "course", ColumnStats::new("integer", 0.6, 0.0))
        .column("enrollments", "student", ColumnStats::new("integer", 0.7, 0.0))
        .column("enrollments", "grade", ColumnStats::new("text", 0.01, 0.0))
        .build()
        .unwrap();

    let winner = PrimaryKeyScorer::default().score_table(&snapshot, "enrollments").unwrap();
    assert_eq!(winner.columns, vec!["student"]);
    assert_eq!(winner.score, 70.0);
    assert_eq!(winner.single_column(), Some("student"));
}

#[test]
fn test_composite_disabled() {
    let snapshot = SnapshotBuilder::new("dev")
        .table("enrollments", TableStats::new("public", 1_000))
        .column("enrollments", "course", ColumnStats::new("integer", 0.6, 0.0))
        .column("enrollments", "student", ColumnStats::new("integer", 0.7, 0.0))
        .build()
        .unwrap();

    let config = KeyScoringConfig {
        composite_search: false,
        ..KeyScoringConfig::default()
    };
    let winner = PrimaryKeyScorer::new(config).score_table(&snapshot, "enrollments").unwrap();
    assert_eq!(winner.columns, vec!["student"]);
    assert_eq!(winner.label, KeyLabel::Weak);
}

#[test]
fn test_tables_without_key() {
    let snapshot = SnapshotBuilder::new("dev")
        .table("empty", TableStats::new("public", 0))
        .column("empty", "id", ColumnStats::new("integer", 0.0, 0.0))
        .table("logs", TableStats::new("public", 500))
        .column("logs", "level", ColumnStats::new("text", 0.01, 0.0))
        .column("logs", "message", ColumnStats::new("text", 0.3, 0.0))
        .table("bare", TableStats::new("public", 5))
        .build()
        .unwrap();

    let outcome = PrimaryKeyScorer::default().score_snapshot(&snapshot);
    assert!(outcome.candidates.is_empty());
    assert_eq!(outcome.tables_without_key, vec!["bare", "empty", "logs"]);
}

#[test]
fn test_declared_key_comparison() {
    let snapshot = SnapshotBuilder::new("dev")
        .table("orders", TableStats::new("public", 100).with_declared_primary_key(["ID"]))
        .column("orders", "id", ColumnStats::new("integer", 1.0, 0.0))
        .table("items", TableStats::new("public", 100).with_declared_primary_key(["sku"]))
        .column("items", "id", ColumnStats::new("integer", 1.0, 0.0))
        .column("items", "sku", ColumnStats::new("text", 0.5, 0.0))
        .table("notes", TableStats::new("public", 100))
        .column("notes", "id", ColumnStats::new("integer", 1.0, 0.0))
        .build()
        .unwrap();

    let outcome = PrimaryKeyScorer::default().score_snapshot(&snapshot);
    assert_eq!(outcome.winner("orders").unwrap().matches_declared, Some(true));
    assert_eq!(outcome.winner("items").unwrap().matches_declared, Some(false));
    assert_eq!(outcome.winner("notes").unwrap().matches_declared, None);
}

#[test]
fn test_scoring_is_deterministic() {
    let scorer = PrimaryKeyScorer::default();
    let first = scorer.score_snapshot(&users_snapshot());
    for _ in 0..10 {
        assert_eq!(scorer.score_snapshot(&users_snapshot()), first);
    }
}
