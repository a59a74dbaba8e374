use anyhow::Result;
use std::path::PathBuf;

/// Datasets are read from `.csv` (`x,t` layout) or `.json` (`Data`/`Labels`) files.
pub fn validate_dataset_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("csv") | Some("json") => {}
        _ => anyhow::bail!("File must have a .csv or .json extension: {}", path),
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}
