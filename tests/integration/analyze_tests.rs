//! Integration tests for structural analysis and duplicate detection

use crate::common::{ParquetColumn, TestFixture};
use tabinspect::progress::{NoProgress, ProgressObserver, ProgressUpdate};
use tabinspect::{analyze, find_duplicates, AnalyzeOptions, SourceKind, Value};

#[derive(Default)]
struct CountingObserver {
    updates: Vec<ProgressUpdate>,
    finished: bool,
}

impl ProgressObserver for CountingObserver {
    fn on_progress(&mut self, update: ProgressUpdate) {
        self.updates.push(update);
    }

    fn on_finish(&mut self, _message: &str) {
        self.finished = true;
    }
}

#[test]
fn test_short_text_row_is_malformed() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_csv_raw("short.csv", "a,b,c\n1,2,3\n4,5\n6,7,8\n")
        .unwrap();
    let source = fixture.open(&path).unwrap();

    let report = analyze(source.as_ref(), &AnalyzeOptions::default(), &mut NoProgress).unwrap();
    assert_eq!(report.source_kind, SourceKind::Text);
    assert_eq!(report.expected_field_count, Some(3));
    assert_eq!(report.malformed_row_numbers, vec![2]);
    assert_eq!(report.field_count_histogram.get(&3), Some(&2));
    assert_eq!(report.field_count_histogram.get(&2), Some(&1));
    assert!(!report.is_consistent());
}

#[test]
fn test_first_audited_row_sets_expected_width() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_csv_raw("wide.csv", "a,b\n1,2,3\n4,5\n6,7,8\n")
        .unwrap();
    let source = fixture.open(&path).unwrap();

    let report = analyze(source.as_ref(), &AnalyzeOptions::default(), &mut NoProgress).unwrap();
    assert_eq!(report.expected_field_count, Some(3));
    assert_eq!(report.malformed_row_numbers, vec![2]);
}

#[test]
fn test_skip_header_leaves_first_row_out() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_csv_raw("noheader.csv", "id,name\n1\n2,b\n3,c\n")
        .unwrap();
    let options = tabinspect::SourceOptions {
        delimiter: None,
        has_header: false,
    };
    let source = tabinspect::open_source(&path, &options).unwrap();

    let plain = analyze(source.as_ref(), &AnalyzeOptions::default(), &mut NoProgress).unwrap();
    assert_eq!(plain.malformed_row_numbers, vec![2]);

    let skipping = AnalyzeOptions {
        skip_header: true,
        ..Default::default()
    };
    let report = analyze(source.as_ref(), &skipping, &mut NoProgress).unwrap();
    assert_eq!(report.rows_scanned, 3);
    assert_eq!(report.expected_field_count, Some(1));
    assert_eq!(report.malformed_row_numbers, vec![3, 4]);
}

#[test]
fn test_typed_analysis_reports_nulls_and_sparse_rows() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.create_products_parquet("products.parquet", 2).unwrap();
    let source = fixture.open(&path).unwrap();

    let options = AnalyzeOptions {
        capture_malformed_data: true,
        ..Default::default()
    };
    let report = analyze(source.as_ref(), &options, &mut NoProgress).unwrap();

    assert_eq!(report.expected_field_count, None);
    assert_eq!(report.malformed_row_numbers, vec![2, 5]);
    assert_eq!(report.sparse_row_numbers, vec![5]);
    assert_eq!(report.malformed_rows.len(), 2);
    assert_eq!(report.malformed_rows[1].values[0], Value::Integer(5));

    let nulls = report.null_percentage_per_column.as_ref().unwrap();
    assert_eq!(nulls.keys().collect::<Vec<_>>(), vec!["id", "name", "price"]);
    assert_eq!(nulls["id"], 0.0);
    assert!((nulls["name"] - 0.4).abs() < 1e-12);
    assert!((nulls["price"] - 0.2).abs() < 1e-12);
}

#[test]
fn test_analysis_is_idempotent() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.create_products_parquet("products.parquet", 3).unwrap();
    let source = fixture.open(&path).unwrap();
    let options = AnalyzeOptions {
        capture_malformed_data: true,
        duplicate_key_width: Some(2),
        ..Default::default()
    };

    let first = analyze(source.as_ref(), &options, &mut NoProgress).unwrap();
    let second = analyze(source.as_ref(), &options, &mut NoProgress).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_progress_fires_on_interval_and_final_row() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.create_large_csv("large.csv", 250).unwrap();
    let source = fixture.open(&path).unwrap();

    let mut observer = CountingObserver::default();
    analyze(source.as_ref(), &AnalyzeOptions::default(), &mut observer).unwrap();

    assert!(observer.finished);
    assert!(observer.updates.iter().all(|u| u.interval == 3 && u.total == 250));
    assert_eq!(observer.updates.last().map(|u| u.current), Some(250));
}

#[test]
fn test_duplicate_groups() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_csv_raw("dupes.csv", "id,name\n1,a\n1,a\n2,b\n")
        .unwrap();
    let source = fixture.open(&path).unwrap();

    let groups = find_duplicates(source.as_ref(), 1, &mut NoProgress).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, vec![Value::Integer(1)]);
    assert_eq!(groups[0].rows, vec![1, 2]);
}

#[test]
fn test_duplicates_attached_to_analysis() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_parquet(
            "keys.parquet",
            &[
                ("a", ParquetColumn::Utf8(vec![Some("x"), Some("y"), Some("x"), Some("x")])),
                ("b", ParquetColumn::Int64(vec![Some(1), Some(1), Some(1), Some(2)])),
            ],
            2,
        )
        .unwrap();
    let source = fixture.open(&path).unwrap();

    let options = AnalyzeOptions {
        duplicate_key_width: Some(2),
        ..Default::default()
    };
    let report = analyze(source.as_ref(), &options, &mut NoProgress).unwrap();
    let groups = report.duplicates.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, vec![Value::Text("x".into()), Value::Integer(1)]);
    assert_eq!(groups[0].rows, vec![1, 3]);
}

#[test]
fn test_zero_key_width_is_invalid() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.create_products_csv("products.csv").unwrap();
    let source = fixture.open(&path).unwrap();
    assert!(matches!(
        find_duplicates(source.as_ref(), 0, &mut NoProgress),
        Err(tabinspect::InspectError::InvalidInput { .. })
    ));
}
