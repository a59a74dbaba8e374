//! Builds ready-to-train models from a [`ModelConfig`] and a [`Dataset`].
//!
//! Datasets handed to the factory carry class indices for every classifier
//! (class 0 is class A) and real targets for the regressors. Margin-based
//! models get their +1 / -1 labels through [`Polarity::from_class_index`].
use rand::RngCore;

use crate::config::{ModelConfig, ModelType};
use crate::dataset::{ClassLabels, Dataset, Polarity};
use crate::error::{Result, VmlError};
use crate::models::bayesian_linear_regression::BayesianLinearRegression;
use crate::models::decision_tree::DecisionTree;
use crate::models::gaussian_mixture::GaussianMixture;
use crate::models::kmeans::KMeans;
use crate::models::knn::{Knn, KnnTask};
use crate::models::lvq::Lvq1;
use crate::models::model_trait::{BatchModel, IterativeModel, Model, Prediction};
use crate::models::naive_bayes::NaiveBayes;
use crate::models::perceptron::Perceptron;
use crate::models::polynomial_regression::PolynomialRegression;
use crate::models::softmax_regression::SoftmaxRegression;
use crate::models::svm::Svm;

type StepFn<M> = Box<dyn FnMut(&mut M, &mut dyn RngCore) -> Result<()> + Send>;
type FitFn<M> = Box<dyn FnMut(&mut M) -> Result<()> + Send>;

/// A native model plus the hyperparameters its training step needs.
pub struct StepJob<M> {
    model: M,
    step: StepFn<M>,
    score: fn(&M) -> Result<f64>,
    higher_is_better: bool,
}

impl<M: Model> StepJob<M> {
    pub fn new(
        model: M,
        step: impl FnMut(&mut M, &mut dyn RngCore) -> Result<()> + Send + 'static,
        score: fn(&M) -> Result<f64>,
        higher_is_better: bool,
    ) -> Self {
        Self {
            model,
            step: Box::new(step),
            score,
            higher_is_better,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: Model> Model for StepJob<M> {
    fn name(&self) -> &'static str {
        self.model.name()
    }

    fn is_ready(&self) -> bool {
        self.model.is_ready()
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        self.model.predict(x)
    }
}

impl<M: Model> IterativeModel for StepJob<M> {
    fn step(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        (self.step)(&mut self.model, rng)
    }

    fn training_score(&self) -> Result<f64> {
        (self.score)(&self.model)
    }

    fn higher_is_better(&self) -> bool {
        self.higher_is_better
    }
}

/// A native model plus the data and hyperparameters of its one-shot fit.
pub struct BatchJob<M> {
    model: M,
    fit: FitFn<M>,
}

impl<M: Model> BatchJob<M> {
    pub fn new(model: M, fit: impl FnMut(&mut M) -> Result<()> + Send + 'static) -> Self {
        Self {
            model,
            fit: Box::new(fit),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: Model> Model for BatchJob<M> {
    fn name(&self) -> &'static str {
        self.model.name()
    }

    fn is_ready(&self) -> bool {
        self.model.is_ready()
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        self.model.predict(x)
    }
}

impl<M: Model> BatchModel for BatchJob<M> {
    fn fit(&mut self) -> Result<()> {
        (self.fit)(&mut self.model)
    }
}

/// What [`build_model`] hands back: either drive it with `step` or call `fit` once.
pub enum BuiltModel {
    Iterative(Box<dyn IterativeModel>),
    Batch(Box<dyn BatchModel>),
}

impl BuiltModel {
    pub fn name(&self) -> &'static str {
        match self {
            BuiltModel::Iterative(m) => m.name(),
            BuiltModel::Batch(m) => m.name(),
        }
    }

    pub fn is_ready(&self) -> bool {
        match self {
            BuiltModel::Iterative(m) => m.is_ready(),
            BuiltModel::Batch(m) => m.is_ready(),
        }
    }

    pub fn predict(&self, x: &[f64]) -> Result<Prediction> {
        match self {
            BuiltModel::Iterative(m) => m.predict(x),
            BuiltModel::Batch(m) => m.predict(x),
        }
    }
}

fn polarities(data: &Dataset) -> Result<Vec<Polarity>> {
    data.class_labels(2)?.to_polarities()
}

fn class_labels(data: &Dataset, num_classes: Option<usize>) -> Result<ClassLabels> {
    let num_classes = match num_classes {
        Some(n) => n,
        None => data.infer_num_classes()?,
    };
    data.class_labels(num_classes)
}

fn iterative<M: Model + 'static>(job: StepJob<M>) -> BuiltModel {
    BuiltModel::Iterative(Box::new(job))
}

fn batch<M: Model + 'static>(job: BatchJob<M>) -> BuiltModel {
    BuiltModel::Batch(Box::new(job))
}

/// Build a model from `config` over `data`.
///
/// Iterative models come back initialized, with random draws taken from
/// `rng`. Batch models own a copy of the data and fit only on `fit`.
pub fn build_model(
    config: &ModelConfig,
    data: &Dataset,
    rng: &mut dyn RngCore,
) -> Result<BuiltModel> {
    let lr = config.learning_rate;
    if config.model_type.is_iterative() && !lr.is_finite() {
        return Err(VmlError::invalid(format!(
            "learning rate must be a finite number, got {}",
            lr
        )));
    }
    log::debug!(
        "building {} on {}",
        config.model_type.name(),
        data.summary()
    );

    let built = match config.model_type.clone() {
        ModelType::Perceptron {} => {
            let mut model = Perceptron::new();
            model.init_labeled(&data.x, &polarities(data)?, rng)?;
            iterative(StepJob::new(
                model,
                move |m: &mut Perceptron, rng| m.fit_step(lr, rng),
                Perceptron::compute_error,
                false,
            ))
        }

        ModelType::PolynomialRegression {
            degree,
            regularization,
            closed_form,
            clip_threshold,
        } => {
            if data.dim() != 1 {
                return Err(VmlError::invalid(format!(
                    "polynomial regression takes one input feature, got {}",
                    data.dim()
                )));
            }
            let mut model = PolynomialRegression::new();
            model.init(degree, &data.x.column(0), &data.y, rng)?;
            if closed_form {
                batch(BatchJob::new(model, move |m: &mut PolynomialRegression| {
                    m.fit(regularization)
                }))
            } else {
                iterative(StepJob::new(
                    model,
                    move |m: &mut PolynomialRegression, _| {
                        m.update_weights(lr, regularization, clip_threshold)
                    },
                    PolynomialRegression::compute_error,
                    false,
                ))
            }
        }

        ModelType::BayesianLinearRegression { alpha, beta } => {
            let x = data.x.clone();
            let y = data.y.clone();
            batch(BatchJob::new(
                BayesianLinearRegression::new(),
                move |m: &mut BayesianLinearRegression| m.fit(&x, &y, alpha, beta),
            ))
        }

        ModelType::SoftmaxRegression {
            num_classes,
            l2,
            clip_threshold,
        } => {
            let labels = class_labels(data, num_classes)?;
            let mut model = SoftmaxRegression::new();
            model.init(&data.x, &labels, rng)?;
            iterative(StepJob::new(
                model,
                move |m: &mut SoftmaxRegression, _| m.train_step(lr, l2, clip_threshold),
                SoftmaxRegression::log_likelihood,
                true,
            ))
        }

        ModelType::Knn { k, task } => {
            let labels: Vec<f64> = match task {
                KnnTask::Classification => {
                    polarities(data)?.into_iter().map(Polarity::as_f64).collect()
                }
                KnnTask::Regression => data.y.clone(),
            };
            let x = data.x.clone();
            batch(BatchJob::new(Knn::new(), move |m: &mut Knn| {
                m.init(&x, &labels, k, task)
            }))
        }

        ModelType::KMeans { num_clusters } => {
            let mut model = KMeans::new();
            model.init(&data.x, num_clusters, rng)?;
            iterative(StepJob::new(
                model,
                |m: &mut KMeans, _| m.fit_step(),
                KMeans::inertia,
                false,
            ))
        }

        ModelType::GaussianMixture { num_components } => {
            let mut model = GaussianMixture::new();
            model.init(&data.x, num_components, rng)?;
            iterative(StepJob::new(
                model,
                |m: &mut GaussianMixture, _| m.fit_step(),
                GaussianMixture::log_likelihood,
                true,
            ))
        }

        ModelType::Lvq1 {
            num_classes,
            prototypes_per_class,
        } => {
            let labels = class_labels(data, num_classes)?;
            let mut model = Lvq1::new();
            model.init(&data.x, &labels, prototypes_per_class, rng)?;
            iterative(StepJob::new(
                model,
                move |m: &mut Lvq1, rng| m.fit_step(lr, rng),
                Lvq1::training_accuracy,
                true,
            ))
        }

        ModelType::NaiveBayes {} => {
            let mut groups = data.split_by_class(2)?;
            let class_b = groups.remove(1);
            let class_a = groups.remove(0);
            batch(BatchJob::new(NaiveBayes::new(), move |m: &mut NaiveBayes| {
                m.fit(&class_a, &class_b)
            }))
        }

        ModelType::DecisionTree {
            num_classes,
            max_depth,
            num_features,
        } => {
            let labels = class_labels(data, num_classes)?;
            let num_features = num_features.unwrap_or_else(|| data.dim());
            let x = data.x.clone();
            batch(BatchJob::new(DecisionTree::new(), move |m: &mut DecisionTree| {
                m.fit(&x, &labels, max_depth, num_features)
            }))
        }

        ModelType::Svm { c, kernel } => {
            kernel.validate()?;
            let mut model = Svm::new();
            model.init(&data.x, &polarities(data)?, c, Box::new(kernel))?;
            iterative(StepJob::new(
                model,
                move |m: &mut Svm, rng| m.fit_step(lr, rng),
                Svm::compute_error,
                true,
            ))
        }
    };
    Ok(built)
}
