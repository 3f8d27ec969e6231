//! Integration tests for the table comparator

use crate::common::{ParquetColumn, TestFixture};
use tabinspect::{compare, CompareOptions, Tolerance};

fn options(fuzzy: bool) -> CompareOptions {
    CompareOptions {
        fuzzy,
        tolerance: Tolerance { rel: 1e-6, abs: 0.0 },
        ..Default::default()
    }
}

#[test]
fn test_tiny_difference_is_equal_only_under_tolerance() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture
        .create_parquet(
            "a.parquet",
            &[("x", ParquetColumn::Double(vec![Some(1.0), Some(2.0)]))],
            10,
        )
        .unwrap();
    let b = fixture
        .create_parquet(
            "b.parquet",
            &[("x", ParquetColumn::Double(vec![Some(1.0 + 1e-9), Some(2.0)]))],
            10,
        )
        .unwrap();
    let a = fixture.open(&a).unwrap();
    let b = fixture.open(&b).unwrap();

    let fuzzy = compare(a.as_ref(), b.as_ref(), &options(true)).unwrap();
    assert!(fuzzy.data_checked);
    assert!(fuzzy.data_match);
    assert!(fuzzy.identical());

    let exact = compare(a.as_ref(), b.as_ref(), &options(false)).unwrap();
    assert!(!exact.data_match);
    assert!(!exact.identical());
    assert_eq!(exact.column_diff_counts.get("x"), Some(&1));
}

#[test]
fn test_identical_csv_files() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_products_csv("a.csv").unwrap();
    let b = fixture.create_products_csv("b.csv").unwrap();
    let a = fixture.open(&a).unwrap();
    let b = fixture.open(&b).unwrap();

    let result = compare(a.as_ref(), b.as_ref(), &CompareOptions::default()).unwrap();
    assert!(result.schema_match);
    assert!(result.shape_match);
    assert!(result.data_match);
    assert!(result.column_diff_counts.is_empty());
    assert!(result.identical());
}

#[test]
fn test_shape_mismatch_skips_data() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_csv_raw("a.csv", "id,v\n1,2\n3,4\n").unwrap();
    let b = fixture.create_csv_raw("b.csv", "id,v\n1,2\n").unwrap();
    let a = fixture.open(&a).unwrap();
    let b = fixture.open(&b).unwrap();

    let result = compare(a.as_ref(), b.as_ref(), &CompareOptions::default()).unwrap();
    assert!(result.schema_match);
    assert!(!result.shape_match);
    assert!(!result.data_checked);
    assert_eq!(result.expected_shape.rows, 2);
    assert_eq!(result.actual_shape.rows, 1);
    assert!(!result.identical());
}

#[test]
fn test_schema_mismatches_keep_data_diagnostics() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture
        .create_csv_raw("a.csv", "id,name,price\n1,Apple,2\n2,Pear,3\n")
        .unwrap();
    let b = fixture
        .create_csv_raw("b.csv", "key,name,cost\n1,Apple,2\n2,Plum,3\n")
        .unwrap();
    let a = fixture.open(&a).unwrap();
    let b = fixture.open(&b).unwrap();

    let result = compare(a.as_ref(), b.as_ref(), &CompareOptions::default()).unwrap();
    assert!(!result.schema_match);
    let positions: Vec<usize> = result.field_mismatches.iter().map(|m| m.index).collect();
    assert_eq!(positions, vec![1, 3]);
    assert!(result.data_checked);
    assert_eq!(result.column_diff_counts.get("name"), Some(&1));
    assert!(!result.identical());

    let no_schema = CompareOptions {
        check_schema: false,
        check_data: false,
        ..Default::default()
    };
    let result = compare(a.as_ref(), b.as_ref(), &no_schema).unwrap();
    assert!(result.identical());
}

#[test]
fn test_null_positions_must_agree() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture
        .create_parquet(
            "a.parquet",
            &[("x", ParquetColumn::Double(vec![None, Some(f64::NAN), Some(3.0)]))],
            10,
        )
        .unwrap();
    let b = fixture
        .create_parquet(
            "b.parquet",
            &[("x", ParquetColumn::Double(vec![None, Some(f64::NAN), None]))],
            10,
        )
        .unwrap();
    let a = fixture.open(&a).unwrap();
    let b = fixture.open(&b).unwrap();

    let result = compare(a.as_ref(), b.as_ref(), &options(true)).unwrap();
    assert!(!result.data_match);
    assert_eq!(result.column_diff_counts.get("x"), Some(&1));
}

#[test]
fn test_batches_cover_every_row() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_large_csv("a.csv", 95).unwrap();
    let mut content = std::fs::read_to_string(&a).unwrap();
    content = content.replace("\n90,g6,45\n", "\n90,g6,45.5\n");
    let b = fixture.create_csv_raw("b.csv", &content).unwrap();
    let a = fixture.open(&a).unwrap();
    let b = fixture.open(&b).unwrap();

    let small_batches = CompareOptions {
        batch_size: 7,
        ..options(true)
    };
    let result = compare(a.as_ref(), b.as_ref(), &small_batches).unwrap();
    assert!(!result.data_match);
    assert_eq!(result.column_diff_counts.len(), 1);
    assert_eq!(result.column_diff_counts.get("value"), Some(&1));
}

#[test]
fn test_text_and_typed_sources_compare_by_value() {
    let fixture = TestFixture::new().unwrap();
    let csv = fixture
        .create_csv_raw("a.csv", "id,price\n1,1.5\n2,\n")
        .unwrap();
    let parquet = fixture
        .create_parquet(
            "b.parquet",
            &[
                ("id", ParquetColumn::Int64(vec![Some(1), Some(2)])),
                ("price", ParquetColumn::Double(vec![Some(1.5), None])),
            ],
            10,
        )
        .unwrap();
    let a = fixture.open(&csv).unwrap();
    let b = fixture.open(&parquet).unwrap();

    let result = compare(a.as_ref(), b.as_ref(), &CompareOptions::default()).unwrap();
    // declared types differ: unknown vs integer/float
    assert!(!result.schema_match);
    assert!(result.shape_match);
    assert!(result.data_match);
}

#[test]
fn test_extra_trailing_field_is_a_difference() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_csv_raw("a.csv", "id,v\n1,2\n3,4\n").unwrap();
    let b = fixture.create_csv_raw("b.csv", "id,v\n1,2,99\n3,4\n").unwrap();
    let a = fixture.open(&a).unwrap();
    let b = fixture.open(&b).unwrap();

    let result = compare(a.as_ref(), b.as_ref(), &CompareOptions::default()).unwrap();
    assert!(result.shape_match);
    assert!(!result.data_match);
    assert!(!result.identical());
    assert_eq!(result.column_diff_counts.get("_extra_1"), Some(&1));
    assert_eq!(result.column_diff_counts.len(), 1);
}

#[test]
fn test_parquet_batches_span_row_groups() {
    let fixture = TestFixture::new().unwrap();
    let values: Vec<Option<i64>> = (0..50).map(Some).collect();
    let mut changed = values.clone();
    changed[33] = Some(-1);
    let a = fixture
        .create_parquet("a.parquet", &[("n", ParquetColumn::Int64(values))], 40)
        .unwrap();
    let b = fixture
        .create_parquet("b.parquet", &[("n", ParquetColumn::Int64(changed))], 40)
        .unwrap();
    let a = fixture.open(&a).unwrap();
    let b = fixture.open(&b).unwrap();

    let batched = CompareOptions {
        batch_size: 6,
        ..Default::default()
    };
    let result = compare(a.as_ref(), b.as_ref(), &batched).unwrap();
    assert!(!result.data_match);
    assert_eq!(result.column_diff_counts.get("n"), Some(&1));

    let same = compare(a.as_ref(), a.as_ref(), &batched).unwrap();
    assert!(same.identical());
}
