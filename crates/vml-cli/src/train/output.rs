use anyhow::{Context, Result};
use std::path::Path;

use vml_models::evaluation::{ClassifierEvaluation, RegressionEvaluation};
use vml_models::models::factory::BuiltModel;
use vml_models::models::Prediction;
use vml_models::Dataset;

use super::trainer::RunSummary;

pub fn collect_predictions(model: &BuiltModel, data: &Dataset) -> Result<Vec<Prediction>> {
    data.x
        .rows()
        .map(|row| {
            model
                .predict(row)
                .with_context(|| format!("Failed to predict {:?}", row))
        })
        .collect()
}

/// Log training-set metrics matching the kind of prediction the model makes.
pub fn log_metrics(predictions: &[Prediction], data: &Dataset) -> Result<()> {
    match predictions.first() {
        Some(Prediction::Probabilities(p)) => {
            let probs: Vec<Vec<f64>> = predictions
                .iter()
                .filter_map(|p| match p {
                    Prediction::Probabilities(p) => Some(p.clone()),
                    _ => None,
                })
                .collect();
            let labels = match data.class_labels(p.len()) {
                Ok(labels) => labels,
                Err(e) => {
                    log::warn!("Skipping classification metrics: {}", e);
                    return Ok(());
                }
            };
            let metrics = ClassifierEvaluation::new(probs, labels)?.all_metrics();
            log::info!("Training metrics: {}", serde_json::to_string(&metrics)?);
        }
        Some(Prediction::Value(_)) => {
            let values = predictions.iter().map(Prediction::value).collect();
            let metrics = RegressionEvaluation::new(values, data.y.clone())?.all_metrics();
            log::info!("Training metrics: {}", serde_json::to_string(&metrics)?);
        }
        _ => {}
    }
    Ok(())
}

/// One row per sample: coordinates, label, predicted class or value, and the
/// class scores when the model produces them.
pub fn write_predictions<P: AsRef<Path>>(
    path: P,
    data: &Dataset,
    predictions: &[Prediction],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(&path).with_context(|| {
        format!("Failed to create prediction file: {}", path.as_ref().display())
    })?;
    writer.write_record(["x", "t", "prediction", "scores"])?;
    for ((row, label), prediction) in data.x.rows().zip(&data.y).zip(predictions) {
        let coords = join(row);
        let (predicted, scores) = match prediction {
            Prediction::Probabilities(p) => (
                prediction.class().map(|c| c.to_string()).unwrap_or_default(),
                join(p),
            ),
            Prediction::Cluster(c) => (c.to_string(), String::new()),
            Prediction::Value(v) | Prediction::Density(v) => (v.to_string(), String::new()),
        };
        writer.write_record([coords, label.to_string(), predicted, scores])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_curves<P: AsRef<Path>>(path: P, runs: &[RunSummary]) -> Result<()> {
    let json = serde_json::to_string_pretty(runs)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write curve file: {}", path.as_ref().display()))
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
