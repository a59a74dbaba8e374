//! Import and export of labeled 2D datasets.
//!
//! Two text formats are supported: a two-column CSV (`x,t`) whose first
//! column holds the space-separated coordinates, and a JSON object with
//! `Data` and `Labels` arrays.
use std::path::Path;

use anyhow::{anyhow, Result};

use crate::dataset::Dataset;

pub mod labeled_csv;
pub mod labeled_json;

pub use labeled_csv::{read_labeled_csv, write_labeled_csv};
pub use labeled_json::{read_labeled_json, write_labeled_json};

/// Read a dataset, picking the format from the file extension.
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("csv") => read_labeled_csv(path),
        Some("json") => read_labeled_json(path),
        _ => Err(anyhow!(
            "Unsupported dataset format: {} (expected .csv or .json)",
            path.display()
        )),
    }
}

/// Write a dataset, picking the format from the file extension.
pub fn write_dataset<P: AsRef<Path>>(path: P, data: &Dataset) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("csv") => write_labeled_csv(path, data),
        Some("json") => write_labeled_json(path, data),
        _ => Err(anyhow!(
            "Unsupported dataset format: {} (expected .csv or .json)",
            path.display()
        )),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
