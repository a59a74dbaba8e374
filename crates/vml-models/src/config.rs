use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::knn::KnnTask;
pub use crate::models::kernels::KernelConfig;

/// Central configuration for models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Step size of iterative models; ignored by the closed-form ones.
    pub learning_rate: f64,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
///
/// `num_classes: None` means "infer from the largest class index in the data".
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    Perceptron {},
    PolynomialRegression {
        degree: usize,
        regularization: f64,
        /// Solve the ridge normal equations once instead of taking gradient steps.
        closed_form: bool,
        clip_threshold: Option<f64>,
    },
    BayesianLinearRegression {
        alpha: f64,
        beta: f64,
    },
    SoftmaxRegression {
        num_classes: Option<usize>,
        l2: f64,
        clip_threshold: Option<f64>,
    },
    Knn {
        k: usize,
        task: KnnTask,
    },
    KMeans {
        num_clusters: usize,
    },
    GaussianMixture {
        num_components: usize,
    },
    Lvq1 {
        num_classes: Option<usize>,
        prototypes_per_class: usize,
    },
    NaiveBayes {},
    DecisionTree {
        num_classes: Option<usize>,
        max_depth: usize,
        num_features: Option<usize>,
    },
    Svm {
        c: f64,
        kernel: KernelConfig,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::Perceptron {}
    }
}

impl ModelType {
    /// Stable identifier, matching [`crate::models::Model::name`].
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::Perceptron {} => "perceptron",
            ModelType::PolynomialRegression { .. } => "polynomial_regression",
            ModelType::BayesianLinearRegression { .. } => "bayesian_linear_regression",
            ModelType::SoftmaxRegression { .. } => "softmax_regression",
            ModelType::Knn { .. } => "knn",
            ModelType::KMeans { .. } => "kmeans",
            ModelType::GaussianMixture { .. } => "gaussian_mixture",
            ModelType::Lvq1 { .. } => "lvq1",
            ModelType::NaiveBayes {} => "naive_bayes",
            ModelType::DecisionTree { .. } => "decision_tree",
            ModelType::Svm { .. } => "svm",
        }
    }

    /// Whether the factory wraps this model as an iterative (step-driven) model.
    pub fn is_iterative(&self) -> bool {
        match self {
            ModelType::PolynomialRegression { closed_form, .. } => !closed_form,
            ModelType::BayesianLinearRegression { .. }
            | ModelType::Knn { .. }
            | ModelType::NaiveBayes {}
            | ModelType::DecisionTree { .. } => false,
            _ => true,
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "perceptron" => Ok(ModelType::Perceptron {}),
            "polynomial_regression" | "polynomial" => Ok(ModelType::PolynomialRegression {
                degree: 3,
                regularization: 0.0,
                closed_form: true,
                clip_threshold: Some(crate::models::polynomial_regression::DEFAULT_CLIP_THRESHOLD),
            }),
            "bayesian_linear_regression" | "blr" => Ok(ModelType::BayesianLinearRegression {
                alpha: 1.0,
                beta: 25.0,
            }),
            "softmax_regression" | "softmax" | "logistic_regression" => {
                Ok(ModelType::SoftmaxRegression {
                    num_classes: None,
                    l2: 0.0,
                    clip_threshold: None,
                })
            }
            "knn" => Ok(ModelType::Knn {
                k: 3,
                task: KnnTask::Classification,
            }),
            "kmeans" | "k_means" => Ok(ModelType::KMeans { num_clusters: 2 }),
            "gaussian_mixture" | "gmm" => Ok(ModelType::GaussianMixture { num_components: 2 }),
            "lvq1" | "lvq" => Ok(ModelType::Lvq1 {
                num_classes: None,
                prototypes_per_class: 1,
            }),
            "naive_bayes" => Ok(ModelType::NaiveBayes {}),
            "decision_tree" | "tree" => Ok(ModelType::DecisionTree {
                num_classes: None,
                max_depth: 5,
                num_features: None,
            }),
            "svm" => Ok(ModelType::Svm {
                c: 1.0,
                kernel: KernelConfig::default(),
            }),
            _ => Err(format!("Unknown model type: {}", s)),
        }
    }
}

impl ModelConfig {
    pub fn new(learning_rate: f64, model_type: ModelType) -> Self {
        Self {
            learning_rate,
            model_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            model_type: ModelType::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(
            "KMeans".parse::<ModelType>().unwrap(),
            ModelType::KMeans { num_clusters: 2 }
        );
        assert_eq!("gmm".parse::<ModelType>().unwrap().name(), "gaussian_mixture");
        assert_eq!("Naive-Bayes".parse::<ModelType>().unwrap(), ModelType::NaiveBayes {});
        assert!("xgboost".parse::<ModelType>().is_err());
    }

    #[test]
    fn test_json_layout() {
        let config = ModelConfig::new(
            0.05,
            ModelType::Svm {
                c: 2.0,
                kernel: KernelConfig::Gaussian { sigma: 0.5 },
            },
        );
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["learning_rate"], 0.05);
        assert_eq!(json["Svm"]["kernel"]["type"], "gaussian");

        let back: ModelConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_iterative_split() {
        assert!(ModelType::default().is_iterative());
        assert!(!"naive_bayes".parse::<ModelType>().unwrap().is_iterative());
        assert!(!"polynomial".parse::<ModelType>().unwrap().is_iterative());
    }
}
