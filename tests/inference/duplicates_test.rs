// tests/inference/duplicates_test.rs
use relic::inference::{DuplicateConfig, DuplicateRowDetector, DuplicateSeverity, EstimateBasis};
use relic::snapshot::{Row, Value};

fn row(id: i64, status: &str) -> Row {
    vec![Value::Int(id), Value::from(status)]
}

#[test]
fn test_full_row_equality() {
    // Same id, different status: not a duplicate.
    let rows = vec![row(1, "open"), row(1, "closed"), row(2, "open")];
    let estimate = DuplicateRowDetector::default().estimate("tickets", &rows);

    assert_eq!(estimate.duplicate_row_fraction, 0.0);
    assert_eq!(estimate.severity, DuplicateSeverity::None);
    assert_eq!(estimate.distinct_rows, 3);
}

#[test]
fn test_estimate_states_its_sample() {
    let mut rows: Vec<Row> = (0..8).map(|i| row(i, "open")).collect();
    rows.push(row(0, "open"));
    rows.push(row(0, "open"));

    let estimate = DuplicateRowDetector::default().estimate("tickets", &rows);
    assert_eq!(estimate.table, "tickets");
    assert_eq!(estimate.basis, EstimateBasis::Sample);
    assert_eq!(estimate.sample_size, 10);
    assert_eq!(estimate.distinct_rows, 8);
    assert_eq!(estimate.excess_rows, 2);
    assert_eq!(estimate.sample_group_count, 1);
    assert_eq!(estimate.duplicate_row_fraction, 0.2);
    assert_eq!(estimate.severity, DuplicateSeverity::High);
}

#[test]
fn test_low_severity_at_or_below_high_bar() {
    let mut rows: Vec<Row> = (0..10).map(|i| row(i, "open")).collect();
    rows.push(row(3, "open"));

    let estimate = DuplicateRowDetector::default().estimate("tickets", &rows);
    assert_eq!(estimate.excess_rows, 1);
    assert_eq!(estimate.severity, DuplicateSeverity::Low);
}

#[test]
fn test_nulls_compare_equal() {
    let rows = vec![
        vec![Value::Null, Value::from("x")],
        vec![Value::Null, Value::from("x")],
    ];
    let estimate = DuplicateRowDetector::default().estimate("t", &rows);
    assert_eq!(estimate.duplicate_row_fraction, 0.5);
}

#[test]
fn test_empty_sample_is_unknown() {
    let estimate = DuplicateRowDetector::default().estimate("t", &[]);
    assert_eq!(estimate.sample_size, 0);
    assert_eq!(estimate.duplicate_row_fraction, 0.0);
    assert_eq!(estimate.severity, DuplicateSeverity::Unknown);
}

#[test]
fn test_sample_bounded_by_limit() {
    let detector = DuplicateRowDetector::new(DuplicateConfig {
        sample_limit: 4,
        ..DuplicateConfig::default()
    });
    let rows: Vec<Row> = (0..4).map(|i| row(i, "a")).chain((0..6).map(|_| row(0, "a"))).collect();

    let estimate = detector.estimate("t", &rows);
    assert_eq!(estimate.sample_size, 4);
    assert_eq!(estimate.severity, DuplicateSeverity::None);
}
