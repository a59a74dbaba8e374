//! Softmax regression (logistic regression for two classes) trained by
//! full-batch gradient descent.
//!
//! There is one weight vector per class except the last. Class scores use the
//! negative exponent `exp(-w_i . x)`. With two classes the single score is
//! turned into the logistic pair `p_0 = 1 / (1 + exp(-w . x))`, `p_1 = 1 - p_0`.
//! With more classes the scores are normalized over the explicit classes only,
//! so the implicit last class is always reported with probability 0.
use rand::RngCore;

use crate::dataset::{check_labels_match, check_non_empty, check_point_dim, ClassLabels};
use crate::error::{Result, VmlError};
use crate::math::linalg::dot;
use crate::math::Array2;
use crate::models::model_trait::{Model, Prediction};
use crate::models::utils::{gradient_clipping, uniform_vec};

#[derive(Debug, Clone, Default)]
pub struct SoftmaxRegression {
    data: Array2<f64>,
    labels: Vec<usize>,
    num_classes: usize,
    params: Vec<Vec<f64>>,
    ready: bool,
}

impl SoftmaxRegression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the data and draw `num_classes - 1` weight vectors in [0, 1).
    pub fn init(
        &mut self,
        x: &Array2<f64>,
        labels: &ClassLabels,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        check_non_empty("SoftmaxRegression::init", x)?;
        check_labels_match("SoftmaxRegression::init", x, labels.len())?;
        if labels.num_classes() < 2 {
            return Err(VmlError::invalid(format!(
                "softmax regression needs at least 2 classes, got {}",
                labels.num_classes()
            )));
        }

        self.data = x.clone();
        self.labels = labels.labels().to_vec();
        self.num_classes = labels.num_classes();
        self.reset_weights(rng);
        self.ready = true;
        Ok(())
    }

    pub fn reset_weights(&mut self, rng: &mut dyn RngCore) {
        let dim = self.data.ncols();
        self.params = (0..self.num_classes.saturating_sub(1))
            .map(|_| uniform_vec(rng, dim, 0.0, 1.0))
            .collect();
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(VmlError::NotReady("softmax regression"))
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn params(&self) -> &[Vec<f64>] {
        &self.params
    }

    /// One gradient-descent step on the negative log-likelihood plus the L2
    /// penalty `l2 * w`, for every weight vector. Predictions are taken once,
    /// before any vector moves. With `clip` set, each vector's gradient is
    /// rescaled to at most that L2 norm.
    pub fn train_step(&mut self, learning_rate: f64, l2: f64, clip: Option<f64>) -> Result<()> {
        self.ensure_ready()?;
        for (name, v) in [("learning rate", learning_rate), ("l2 rate", l2)] {
            if !v.is_finite() {
                return Err(VmlError::invalid(format!(
                    "{} must be a finite number, got {}",
                    name, v
                )));
            }
        }
        if let Some(threshold) = clip {
            if !(threshold.is_finite() && threshold > 0.0) {
                return Err(VmlError::invalid(format!(
                    "clipping threshold must be positive, got {}",
                    threshold
                )));
            }
        }

        let preds = self
            .data
            .rows()
            .map(|row| self.scores(row))
            .collect::<Result<Vec<_>>>()?;

        let n = self.data.nrows() as f64;
        for i in 0..self.params.len() {
            let mut grad = vec![0.0; self.data.ncols()];
            for ((row, &t), pred) in self.data.rows().zip(&self.labels).zip(&preds) {
                let target = if t == i { 1.0 } else { 0.0 };
                let coef = target - pred[i];
                for (g, x) in grad.iter_mut().zip(row) {
                    *g += coef * x;
                }
            }
            for (g, w) in grad.iter_mut().zip(&self.params[i]) {
                *g = *g * (-1.0 / n) + l2 * w;
            }
            if let Some(threshold) = clip {
                grad = gradient_clipping(grad, threshold);
            }
            for (w, g) in self.params[i].iter_mut().zip(&grad) {
                *w -= learning_rate * g;
            }
        }
        Ok(())
    }

    fn scores(&self, x: &[f64]) -> Result<Vec<f64>> {
        let logits = self
            .params
            .iter()
            .map(|w| dot(w, x).map(|z| -z))
            .collect::<Result<Vec<_>>>()?;

        if let &[z] = logits.as_slice() {
            let p0 = 1.0 / (1.0 + z.exp());
            return Ok(vec![p0, 1.0 - p0]);
        }

        // exp(-z_i) / sum_j exp(-z_j), shifted by the largest exponent
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let norm: f64 = exps.iter().sum();
        let mut probs: Vec<f64> = exps.into_iter().map(|e| e / norm).collect();
        probs.push(0.0);
        Ok(probs)
    }

    /// Probability per class, `num_classes` entries.
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.ensure_ready()?;
        check_point_dim("SoftmaxRegression::predict", self.data.ncols(), x)?;
        self.scores(x)
    }

    /// `sum_i log p(t_i | x_i)`; `-inf` once any sample gets probability 0.
    pub fn log_likelihood(&self) -> Result<f64> {
        self.ensure_ready()?;
        let mut total = 0.0;
        for (row, &t) in self.data.rows().zip(&self.labels) {
            total += self.scores(row)?[t].ln();
        }
        Ok(total)
    }
}

impl Model for SoftmaxRegression {
    fn name(&self) -> &'static str {
        "softmax_regression"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        self.predict_proba(x).map(Prediction::Probabilities)
    }
}
