//! Rosenblatt perceptron trained by stochastic, mistake-driven updates.
use rand::RngCore;

use crate::dataset::{check_labels_match, check_non_empty, check_point_dim, Polarity};
use crate::error::{Result, VmlError};
use crate::math::linalg::dot;
use crate::math::Array2;
use crate::models::model_trait::{Model, Prediction};
use crate::models::utils::{random_index, two_class_from_margin, uniform_vec, with_bias};

/// Binary linear classifier. The bias is folded in as a constant trailing
/// feature, so `weights` has one more entry than the input dimension.
#[derive(Debug, Clone, Default)]
pub struct Perceptron {
    weights: Vec<f64>,
    data: Vec<Vec<f64>>,
    labels: Vec<Polarity>,
    dim: usize,
    ready: bool,
}

impl Perceptron {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize from the samples of class A (labelled +1) and class B (-1).
    pub fn init(
        &mut self,
        class_a: &Array2<f64>,
        class_b: &Array2<f64>,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        if class_a.nrows() > 0 && class_b.nrows() > 0 && class_a.ncols() != class_b.ncols() {
            return Err(VmlError::dims(
                "Perceptron::init",
                format!("class B with {} features", class_a.ncols()),
                format!("{} features", class_b.ncols()),
            ));
        }
        let rows: Vec<&[f64]> = class_a.rows().chain(class_b.rows()).collect();
        let labels: Vec<Polarity> = std::iter::repeat(Polarity::Positive)
            .take(class_a.nrows())
            .chain(std::iter::repeat(Polarity::Negative).take(class_b.nrows()))
            .collect();
        let x = Array2::from_rows(&rows)?;
        self.init_labeled(&x, &labels, rng)
    }

    /// Initialize from a sample matrix and matching +/-1 labels.
    pub fn init_labeled(
        &mut self,
        x: &Array2<f64>,
        labels: &[Polarity],
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        check_non_empty("Perceptron::init", x)?;
        check_labels_match("Perceptron::init", x, labels.len())?;

        self.dim = x.ncols();
        self.data = x.rows().map(with_bias).collect();
        self.labels = labels.to_vec();
        self.weights = uniform_vec(rng, self.dim + 1, -1.0, 1.0);
        self.ready = true;

        log::debug!(
            "perceptron initialized with {} samples, {} weights",
            self.data.len(),
            self.weights.len()
        );
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(VmlError::NotReady("perceptron"))
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Pick one random sample and apply the perceptron rule if it is
    /// misclassified. A zero margin counts as a mistake.
    pub fn fit_step(&mut self, learning_rate: f64, rng: &mut dyn RngCore) -> Result<()> {
        self.ensure_ready()?;
        if !learning_rate.is_finite() {
            return Err(VmlError::invalid(format!(
                "learning rate must be a finite number, got {}",
                learning_rate
            )));
        }

        let idx = random_index(rng, self.data.len());
        let input = &self.data[idx];
        let label = self.labels[idx].as_f64();

        let margin = dot(&self.weights, input)?;
        if margin * label > 0.0 {
            return Ok(());
        }

        log::trace!("perceptron update on sample {}", idx);
        for (w, xi) in self.weights.iter_mut().zip(input) {
            *w += learning_rate * label * xi;
        }
        Ok(())
    }

    /// Class scores `[class A, class B]` for a raw (bias-free) point.
    pub fn predict_scores(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.ensure_ready()?;
        check_point_dim("Perceptron::predict", self.dim, x)?;
        Ok(two_class_from_margin(dot(&self.weights, &with_bias(x))?))
    }

    /// `-sum_i (w . x_i) * t_i` over the training set.
    ///
    /// This is the perceptron criterion summed over *all* samples, correctly
    /// classified ones included, so it keeps decreasing after the data is
    /// separated. It is not an error rate.
    pub fn compute_error(&self) -> Result<f64> {
        self.ensure_ready()?;
        let mut total = 0.0;
        for (x, t) in self.data.iter().zip(&self.labels) {
            total += dot(&self.weights, x)? * t.as_f64();
        }
        Ok(-total)
    }

    /// Number of training samples on the wrong side of (or on) the hyperplane.
    pub fn num_misclassified(&self) -> Result<usize> {
        self.ensure_ready()?;
        let mut count = 0;
        for (x, t) in self.data.iter().zip(&self.labels) {
            if dot(&self.weights, x)? * t.as_f64() <= 0.0 {
                count += 1;
            }
        }
        Ok(count)
    }
}

impl Model for Perceptron {
    fn name(&self) -> &'static str {
        "perceptron"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        self.predict_scores(x).map(Prediction::Probabilities)
    }
}
