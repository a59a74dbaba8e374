//! `{"Data": [[x, y], ...], "Labels": [t, ...]}`
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

#[derive(Debug, Serialize, Deserialize)]
struct LabeledJson {
    #[serde(rename = "Data")]
    data: Vec<Vec<f64>>,
    #[serde(rename = "Labels")]
    labels: Vec<f64>,
}

pub fn parse_labeled_json(text: &str) -> Result<Dataset> {
    let parsed: LabeledJson =
        serde_json::from_str(text).context("Invalid format: expected \"Data\" and \"Labels\"")?;
    Ok(Dataset::from_rows(&parsed.data, parsed.labels)?)
}

pub fn to_labeled_json(data: &Dataset) -> Result<String> {
    let out = LabeledJson {
        data: data.x.to_rows(),
        labels: data.y.clone(),
    };
    Ok(serde_json::to_string(&out)?)
}

pub fn read_labeled_json<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read JSON file: {}", path.as_ref().display()))?;
    parse_labeled_json(&text)
        .with_context(|| format!("Failed to parse JSON file: {}", path.as_ref().display()))
}

pub fn write_labeled_json<P: AsRef<Path>>(path: P, data: &Dataset) -> Result<()> {
    std::fs::write(&path, to_labeled_json(data)?)
        .with_context(|| format!("Failed to write JSON file: {}", path.as_ref().display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_export() {
        let data = parse_labeled_json(r#"{"Data": [[1, 2], [3.5, -4]], "Labels": [0, 1]}"#)
            .unwrap();
        assert_eq!(data.x.row(1), &[3.5, -4.0]);
        assert_eq!(data.y, vec![0.0, 1.0]);
        assert_eq!(
            to_labeled_json(&data).unwrap(),
            r#"{"Data":[[1.0,2.0],[3.5,-4.0]],"Labels":[0.0,1.0]}"#
        );
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        assert!(parse_labeled_json(r#"{"Data": [[1, 2]]}"#).is_err());
        assert!(parse_labeled_json(r#"{"Data": [[1, 2]], "Labels": [0, 1]}"#).is_err());
    }
}
