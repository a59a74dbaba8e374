//! Integration tests for CLI config parsing, overrides and the training driver.

use vml_cli::train::input::{TrainConfig, TrainOverrides};
use vml_cli::train::trainer::run_training;
use vml_cli::util::validate_dataset_file;
use vml_models::config::ModelType;

const BLOBS_CSV: &str = "x,t\n-2 -1.5,0\n-1 -2,0\n-1.5 -1,0\n2 1.5,1\n1 2,1\n1.5 1,1\n";

fn write_blobs(dir: &tempfile::TempDir) -> String {
    let path = dir.path().join("blobs.csv");
    std::fs::write(&path, BLOBS_CSV).unwrap();
    path.to_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// validate_dataset_file
// ---------------------------------------------------------------------------

#[test]
fn validate_csv_and_json_files() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["data.csv", "data.JSON"] {
        let path = dir.path().join(name);
        std::fs::File::create(&path).unwrap();
        assert!(validate_dataset_file(path.to_str().unwrap()).is_ok());
    }
}

#[test]
fn validate_wrong_extension_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.tsv");
    std::fs::File::create(&path).unwrap();
    assert!(validate_dataset_file(path.to_str().unwrap()).is_err());
}

#[test]
fn validate_nonexistent_file_errors() {
    assert!(validate_dataset_file("/nonexistent/path/data.csv").is_err());
}

// ---------------------------------------------------------------------------
// TrainConfig defaults, files and overrides
// ---------------------------------------------------------------------------

#[test]
fn train_config_default_values() {
    let cfg = TrainConfig::default();
    assert!(cfg.train_data.is_empty());
    assert!(cfg.steps > 0);
    assert_eq!(cfg.restarts, 1);
    assert_eq!(cfg.model.model_type, ModelType::Perceptron {});
}

#[test]
fn train_config_round_trips_json() {
    let cfg = TrainConfig::default();
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(json.contains("\"Perceptron\""));
    let cfg2: TrainConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg2.model, cfg.model);
    assert_eq!(cfg2.output_file, cfg.output_file);
}

#[test]
fn partial_config_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"steps": 25, "model": {"learning_rate": 0.5, "KMeans": {"num_clusters": 3}}}"#,
    )
    .unwrap();
    let cfg = TrainConfig::from_file(&path).unwrap();
    assert_eq!(cfg.steps, 25);
    assert_eq!(cfg.model.model_type, ModelType::KMeans { num_clusters: 3 });
    assert_eq!(cfg.seed, TrainConfig::default().seed);
}

#[test]
fn unparsable_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "not json").unwrap();
    let cfg = TrainConfig::from_file(&path).unwrap();
    assert_eq!(cfg.steps, TrainConfig::default().steps);
    assert!(TrainConfig::from_file(&dir.path().join("missing.json")).is_err());
}

#[test]
fn overrides_take_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_blobs(&dir);
    let cfg = TrainConfig::default()
        .with_overrides(TrainOverrides {
            train_data: Some(data.clone()),
            model: Some("svm".to_string()),
            steps: Some(7),
            seed: Some(3),
            restarts: Some(2),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(cfg.train_data, data);
    assert_eq!(cfg.model.model_type.name(), "svm");
    assert_eq!((cfg.steps, cfg.seed, cfg.restarts), (7, 3, 2));

    let bad_model = TrainConfig::default().with_overrides(TrainOverrides {
        train_data: Some(data.clone()),
        model: Some("xgboost".to_string()),
        ..Default::default()
    });
    assert!(bad_model.is_err());

    let no_restarts = TrainConfig::default().with_overrides(TrainOverrides {
        train_data: Some(data),
        restarts: Some(0),
        ..Default::default()
    });
    assert!(no_restarts.is_err());
}

// ---------------------------------------------------------------------------
// Training driver
// ---------------------------------------------------------------------------

#[test]
fn run_training_writes_predictions_and_curves() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("predictions.csv");
    let curves = dir.path().join("curves.json");
    let cfg = TrainConfig {
        train_data: write_blobs(&dir),
        output_file: output.to_str().unwrap().to_string(),
        curve_file: Some(curves.to_str().unwrap().to_string()),
        steps: 50,
        restarts: 3,
        log_interval: 10,
        model: vml_models::config::ModelConfig::new(0.1, "softmax".parse().unwrap()),
        ..Default::default()
    };

    let outcome = run_training(&cfg).unwrap();
    assert_eq!(outcome.runs.len(), 3);
    let seeds: Vec<u64> = outcome.runs.iter().map(|r| r.seed).collect();
    assert_eq!(seeds, vec![42, 43, 44]);
    // step 0 plus every 10th step
    assert_eq!(outcome.best_run.curve.len(), 6);
    assert!(outcome.best.is_ready());

    let text = std::fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("x,t,prediction,scores"));
    assert_eq!(lines.count(), 6);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&curves).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 3);
}

#[test]
fn run_training_rejects_zero_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = TrainConfig {
        train_data: write_blobs(&dir),
        output_file: dir.path().join("out.csv").to_str().unwrap().to_string(),
        restarts: 0,
        ..Default::default()
    };
    let err = run_training(&cfg).err().unwrap();
    assert!(err.to_string().contains("restarts"));
    assert!(!dir.path().join("out.csv").exists());
}

#[test]
fn run_training_fits_batch_models() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("tree.csv");
    let cfg = TrainConfig {
        train_data: write_blobs(&dir),
        output_file: output.to_str().unwrap().to_string(),
        model: vml_models::config::ModelConfig::new(0.1, "decision_tree".parse().unwrap()),
        ..Default::default()
    };
    let outcome = run_training(&cfg).unwrap();
    assert!(outcome.best_run.final_score.is_none());
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("-2 -1.5,0,0,1 0"));
}
