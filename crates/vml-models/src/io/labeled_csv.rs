//! `x,t` CSV: one sample per row, coordinates separated by spaces.
//!
//! ```text
//! x,t
//! 0.5 -1.25,0
//! 2 3,1
//! ```
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::dataset::Dataset;

const HEADER: [&str; 2] = ["x", "t"];

/// Parse labeled samples from any reader. The first row is a header and is
/// skipped; blank rows are ignored.
pub fn parse_labeled_csv<R: Read>(input: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut labels = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let coords = record
            .get(0)
            .ok_or_else(|| anyhow!("Missing coordinates at row {}", row_idx + 1))?;
        let point = coords
            .split_whitespace()
            .map(|v| {
                v.parse::<f64>()
                    .with_context(|| format!("Invalid coordinate '{}' at row {}", v, row_idx + 1))
            })
            .collect::<Result<Vec<_>>>()?;
        let label = record
            .get(1)
            .ok_or_else(|| anyhow!("Missing label at row {}", row_idx + 1))?
            .trim();
        let label = label
            .parse::<f64>()
            .with_context(|| format!("Invalid label '{}' at row {}", label, row_idx + 1))?;
        rows.push(point);
        labels.push(label);
    }

    Ok(Dataset::from_rows(&rows, labels).context("Inconsistent sample dimensions")?)
}

pub fn read_labeled_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let file = std::fs::File::open(&path)
        .with_context(|| format!("Failed to open CSV file: {}", path.as_ref().display()))?;
    parse_labeled_csv(file)
        .with_context(|| format!("Failed to parse CSV file: {}", path.as_ref().display()))
}

/// Write `data` as `x,t` CSV with `\r\n` line endings.
pub fn to_labeled_csv<W: Write>(output: W, data: &Dataset) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(output);
    writer.write_record(HEADER)?;
    for (row, label) in data.x.rows().zip(&data.y) {
        let coords = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writer.write_record([coords, label.to_string()])?;
    }
    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn write_labeled_csv<P: AsRef<Path>>(path: P, data: &Dataset) -> Result<()> {
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create CSV file: {}", path.as_ref().display()))?;
    to_labeled_csv(file, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_header_and_blank_rows() {
        let text = "x,t\n0.5 -1.25,0\n\n2 3,1\n";
        let data = parse_labeled_csv(text.as_bytes()).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.x.row(0), &[0.5, -1.25]);
        assert_eq!(data.y, vec![0.0, 1.0]);
    }

    #[test]
    fn test_export_format() {
        let data = Dataset::from_rows(&[[1.0, -2.5], [0.0, 3.0]], vec![1.0, -1.0]).unwrap();
        let mut out = Vec::new();
        to_labeled_csv(&mut out, &data).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "x,t\r\n1 -2.5,1\r\n0 3,-1\r\n");
    }

    #[test]
    fn test_bad_rows_are_reported() {
        assert!(parse_labeled_csv("x,t\n1 abc,0\n".as_bytes()).is_err());
        assert!(parse_labeled_csv("x,t\n1 2\n".as_bytes()).is_err());
        assert!(parse_labeled_csv("x,t\n1 2,0\n1,1\n".as_bytes()).is_err());
    }
}
