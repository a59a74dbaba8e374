//! Integration tests for dataset import/export.

use vml_models::io::{read_dataset, write_dataset};
use vml_models::Dataset;

fn sample() -> Dataset {
    Dataset::from_rows(&[[0.25, -1.0], [3.0, 4.5], [-2.0, 0.0]], vec![0.0, 1.0, 1.0]).unwrap()
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

#[test]
fn csv_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.csv");
    write_dataset(&path, &sample()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("x,t\r\n0.25 -1,0\r\n"));
    assert_eq!(read_dataset(&path).unwrap(), sample());
}

#[test]
fn csv_with_unix_line_endings_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.CSV");
    std::fs::write(&path, "x,t\n1 2,1\n3 4,0\n").unwrap();
    let data = read_dataset(&path).unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data.x.row(1), &[3.0, 4.0]);
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[test]
fn json_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.json");
    write_dataset(&path, &sample()).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["Labels"].as_array().unwrap().len(), 3);
    assert_eq!(read_dataset(&path).unwrap(), sample());
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn unknown_extension_and_missing_file_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(write_dataset(dir.path().join("points.mat"), &sample()).is_err());
    assert!(read_dataset(dir.path().join("missing.csv")).is_err());

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"Points": []}"#).unwrap();
    let err = read_dataset(&bad).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse JSON file"));
}
