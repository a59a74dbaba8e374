use rand::RngCore;

use crate::error::Result;

/// What a model returns for a single query point.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// One probability (or one-hot score) per class; index 0 is class A.
    Probabilities(Vec<f64>),
    /// A regression output.
    Value(f64),
    /// Index of the nearest cluster centroid.
    Cluster(usize),
    /// A (mixture) density value.
    Density(f64),
}

impl Prediction {
    /// Predicted class for probabilistic outputs (first maximum wins), or the
    /// cluster index for clustering outputs.
    pub fn class(&self) -> Option<usize> {
        match self {
            Prediction::Probabilities(p) => super::utils::argmax(p).ok(),
            Prediction::Cluster(c) => Some(*c),
            _ => None,
        }
    }

    /// Scalar view: the regression value, the density, or the class-0 score.
    pub fn value(&self) -> f64 {
        match self {
            Prediction::Probabilities(p) => p.first().copied().unwrap_or(f64::NAN),
            Prediction::Value(v) | Prediction::Density(v) => *v,
            Prediction::Cluster(c) => *c as f64,
        }
    }
}

/// Capabilities shared by every model: readiness and point-wise prediction.
///
/// Model instances own their parameters exclusively and do no internal
/// locking. Training several instances in parallel is fine; sharing one
/// instance across threads while it trains is not supported.
pub trait Model: Send {
    /// Short, stable identifier used in logs and configs.
    fn name(&self) -> &'static str;

    /// `true` once the model has been initialized (or fitted, for batch models).
    fn is_ready(&self) -> bool;

    /// Predict a single point. Fails with `NotReady` before initialization.
    fn predict(&self, x: &[f64]) -> Result<Prediction>;
}

/// Models trained by repeatedly calling a single step.
pub trait IterativeModel: Model {
    /// One training step using the hyperparameters captured at construction.
    fn step(&mut self, rng: &mut dyn RngCore) -> Result<()>;

    /// The value plotted on the training curve. Each model keeps its own
    /// definition (error proxy, log-likelihood, dual objective, ...).
    fn training_score(&self) -> Result<f64>;

    /// Whether larger `training_score` values mean a better fit.
    fn higher_is_better(&self) -> bool;
}

/// Models fitted once, in closed form or by a single recursive build.
pub trait BatchModel: Model {
    fn fit(&mut self) -> Result<()>;
}
