//! Filesystem edge cases: missing, unreadable and misnamed files

use crate::common::TestFixture;
use tabinspect::config::InspectConfig;
use tabinspect::InspectError;

#[test]
fn test_missing_file_is_not_found() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.root().join("missing.csv");
    let err = fixture.open(&path).err().unwrap();
    assert!(matches!(err, InspectError::NotFound { .. }));
    assert!(err.to_string().contains("missing.csv"));
}

#[test]
fn test_directory_is_rejected() {
    let fixture = TestFixture::new().unwrap();
    let err = fixture.open(fixture.root()).err().unwrap();
    assert!(matches!(err, InspectError::InvalidInput { .. }));
}

#[test]
fn test_corrupted_parquet_is_unreadable() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_bytes("broken.parquet", b"\x00\x01\x02\x03invalid_data\xff\xfe")
        .unwrap();
    let err = fixture.open(&path).err().unwrap();
    assert!(matches!(err, InspectError::UnreadableFormat { .. }));
    assert!(err.to_string().contains("broken.parquet"));
}

#[test]
fn test_tsv_extension_selects_tab_delimiter() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.create_csv_raw("data.tsv", "a\tb\n1\t2\n").unwrap();
    let source = fixture.open(&path).unwrap();
    assert_eq!(source.schema().column_names(), vec!["a", "b"]);
}

#[test]
fn test_missing_config_file() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.root().join("nope.json");
    assert!(matches!(
        InspectConfig::load(Some(&path)),
        Err(InspectError::NotFound { .. })
    ));
}
