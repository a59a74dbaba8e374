use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use vml_models::config::{ModelConfig, ModelType};

use crate::util::validate_dataset_file;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub train_data: String,
    pub output_file: String,
    /// Where to write the training curves of every restart as JSON.
    pub curve_file: Option<String>,
    pub model: ModelConfig,
    /// Training steps per restart; ignored by batch models.
    pub steps: usize,
    pub seed: u64,
    pub restarts: usize,
    /// Record the training score every `log_interval` steps.
    pub log_interval: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            train_data: String::new(),
            output_file: String::from("predictions.csv"),
            curve_file: None,
            model: ModelConfig::default(),
            steps: 1000,
            seed: 42,
            restarts: 1,
            log_interval: 100,
        }
    }
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct TrainOverrides {
    pub train_data: Option<String>,
    pub output_file: Option<String>,
    pub model: Option<String>,
    pub steps: Option<usize>,
    pub seed: Option<u64>,
    pub restarts: Option<usize>,
}

impl TrainOverrides {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        TrainOverrides {
            train_data: matches.get_one::<String>("train_data").cloned(),
            output_file: matches.get_one::<String>("output_file").cloned(),
            model: matches.get_one::<String>("model").cloned(),
            steps: matches.get_one::<usize>("steps").copied(),
            seed: matches.get_one::<u64>("seed").copied(),
            restarts: matches.get_one::<usize>("restarts").copied(),
        }
    }
}

impl TrainConfig {
    pub fn from_arguments(config_path: &PathBuf, matches: &ArgMatches) -> Result<Self> {
        let config = Self::from_file(config_path)?;
        config.with_overrides(TrainOverrides::from_matches(matches))
    }

    /// Read a JSON config; content that does not parse falls back to the defaults.
    pub fn from_file(config_path: &PathBuf) -> Result<Self> {
        let config_json = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Ok(serde_json::from_str(&config_json).unwrap_or_else(|e| {
            log::warn!(
                "Could not parse {:?} ({}); falling back to the default config",
                config_path,
                e
            );
            TrainConfig::default()
        }))
    }

    pub fn with_overrides(mut self, overrides: TrainOverrides) -> Result<Self> {
        if let Some(train_data) = overrides.train_data {
            validate_dataset_file(&train_data)?;
            self.train_data = train_data;
        } else {
            validate_dataset_file(&self.train_data)?;
        }

        if let Some(output_file) = overrides.output_file {
            self.output_file = output_file;
        }

        if let Some(model) = overrides.model {
            self.model.model_type = ModelType::from_str(&model).map_err(anyhow::Error::msg)?;
        }

        if let Some(steps) = overrides.steps {
            self.steps = steps;
        }

        if let Some(seed) = overrides.seed {
            self.seed = seed;
        }

        if let Some(restarts) = overrides.restarts {
            self.restarts = restarts;
        }
        if self.restarts == 0 {
            anyhow::bail!("restarts must be at least 1");
        }

        Ok(self)
    }
}
