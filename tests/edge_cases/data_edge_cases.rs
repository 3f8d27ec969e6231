//! Edge cases in file content

use crate::common::TestFixture;
use tabinspect::progress::NoProgress;
use tabinspect::{analyze, context, find, head, AnalyzeOptions, InspectError, Predicate, Value};

#[test]
fn test_empty_csv() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.create_csv_raw("empty.csv", "").unwrap();
    let source = fixture.open(&path).unwrap();

    assert_eq!(source.row_count(), 0);
    assert!(source.schema().is_empty());
    assert!(head(source.as_ref(), 5).unwrap().is_empty());
    assert!(matches!(
        context(source.as_ref(), 1, 2),
        Err(InspectError::InvalidInput { .. })
    ));

    let report = analyze(source.as_ref(), &AnalyzeOptions::default(), &mut NoProgress).unwrap();
    assert_eq!(report.rows_scanned, 0);
    assert!(report.is_consistent());
}

#[test]
fn test_header_only_csv() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.create_csv_raw("header.csv", "a,b,c\n").unwrap();
    let source = fixture.open(&path).unwrap();

    assert_eq!(source.row_count(), 0);
    assert_eq!(source.schema().width(), 3);
}

#[test]
fn test_quoted_fields_with_delimiters_and_newlines() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_csv_raw(
            "quoted.csv",
            "id,note\n1,\"hello, world\"\n2,\"two\nlines\"\n3,plain\n",
        )
        .unwrap();
    let source = fixture.open(&path).unwrap();

    assert_eq!(source.row_count(), 3);
    let rows = source.rows(0, 3).unwrap();
    assert_eq!(rows[0].values[1], Value::Text("hello, world".into()));
    assert_eq!(rows[1].values[1], Value::Text("two\nlines".into()));
    assert_eq!(source.raw_line(1).unwrap().as_deref(), Some("2,\"two\nlines\""));

    let report = analyze(source.as_ref(), &AnalyzeOptions::default(), &mut NoProgress).unwrap();
    assert!(report.is_consistent());
}

#[test]
fn test_crlf_line_endings() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.create_csv_raw("crlf.csv", "a,b\r\n1,2\r\n3,4\r\n").unwrap();
    let source = fixture.open(&path).unwrap();

    assert_eq!(source.row_count(), 2);
    assert_eq!(source.raw_line(0).unwrap().as_deref(), Some("1,2"));
    assert_eq!(source.rows(1, 2).unwrap()[0].values, vec![Value::Integer(3), Value::Integer(4)]);
}

#[test]
fn test_invalid_utf8_row_is_counted_not_fatal() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_bytes("bad.csv", b"id,name\n1,ok\n2,\xff\xfe,extra\n3,fine\n")
        .unwrap();
    let source = fixture.open(&path).unwrap();

    let report = analyze(source.as_ref(), &AnalyzeOptions::default(), &mut NoProgress).unwrap();
    assert_eq!(report.rows_scanned, 3);
    assert_eq!(report.unparseable_rows, 1);
    assert_eq!(report.malformed_row_numbers, vec![2]);
    assert_eq!(
        report.field_count_histogram.values().sum::<usize>(),
        report.rows_scanned
    );
    assert_eq!(report.field_count_histogram.get(&3), Some(&1));
    assert_eq!(report.field_count_histogram.get(&2), Some(&2));

    let predicate = Predicate::parse(r#"{"name": "fine"}"#).unwrap();
    let found = find(source.as_ref(), &predicate, &mut NoProgress).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].number, 3);
}

#[test]
fn test_extra_fields_are_named_past_the_schema() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.create_csv_raw("extra.csv", "a,b\n1,2,3\n").unwrap();
    let source = fixture.open(&path).unwrap();

    let row = &source.rows(0, 1).unwrap()[0];
    let map = row.to_map(source.schema());
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b", "_extra_1"]);
    assert_eq!(map["_extra_1"], Value::Integer(3));
}

#[test]
fn test_unicode_values() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_csv_raw("unicode.csv", "id,name\n1,Café\n2,北京\n3,🚀\n")
        .unwrap();
    let source = fixture.open(&path).unwrap();

    let predicate = Predicate::parse(r#"{"name": "北京"}"#).unwrap();
    let found = find(source.as_ref(), &predicate, &mut NoProgress).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].number, 2);
}
