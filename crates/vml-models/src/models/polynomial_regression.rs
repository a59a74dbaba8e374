//! One-dimensional polynomial regression, fitted either in closed form (ridge)
//! or by full-batch gradient descent.
use rand::RngCore;

use crate::dataset::check_point_dim;
use crate::error::{Result, VmlError};
use crate::math::linalg::{dot, ridge_solve};
use crate::math::Array2;
use crate::models::model_trait::{Model, Prediction};
use crate::models::utils::{gradient_clipping, uniform_vec};
use crate::preprocessing::polynomial_phi;

/// Gradient norm cap used when the caller does not pick one.
pub const DEFAULT_CLIP_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, Default)]
pub struct PolynomialRegression {
    degree: usize,
    weights: Vec<f64>,
    /// Design matrix, one row `(1, x, x^2, ..., x^d)` per sample.
    phi: Array2<f64>,
    targets: Vec<f64>,
    ready: bool,
}

impl PolynomialRegression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the design matrix from `(xs[i], ys[i])` pairs and draw random
    /// weights in [-5, 5]. Degree 0 gives a single bias weight.
    pub fn init(
        &mut self,
        degree: usize,
        xs: &[f64],
        ys: &[f64],
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        if xs.len() != ys.len() {
            return Err(VmlError::dims(
                "PolynomialRegression::init",
                format!("{} targets", xs.len()),
                format!("{} targets", ys.len()),
            ));
        }
        if xs.is_empty() {
            return Err(VmlError::invalid("PolynomialRegression::init: dataset is empty"));
        }

        let rows: Vec<Vec<f64>> = xs.iter().map(|&x| polynomial_phi(x, degree)).collect();
        self.phi = Array2::from_rows(&rows)?;
        self.targets = ys.to_vec();
        self.degree = degree;
        self.weights = uniform_vec(rng, degree + 1, -5.0, 5.0);
        self.ready = true;
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(VmlError::NotReady("polynomial regression"))
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Closed-form ridge regression `w = (Phi^T Phi + reg I)^-1 Phi^T y`.
    pub fn fit(&mut self, reg: f64) -> Result<()> {
        self.ensure_ready()?;
        if !reg.is_finite() || reg < 0.0 {
            return Err(VmlError::invalid(format!(
                "regularization must be a non-negative number, got {}",
                reg
            )));
        }
        self.weights = ridge_solve(&self.phi, &self.targets, reg)?;
        Ok(())
    }

    /// One full-batch gradient-descent step on the squared error.
    ///
    /// The data gradient is averaged over the samples and optionally clipped
    /// to `clip` before the regularization term `reg * |w|` is added.
    pub fn update_weights(
        &mut self,
        learning_rate: f64,
        reg: f64,
        clip: Option<f64>,
    ) -> Result<()> {
        self.ensure_ready()?;
        if !learning_rate.is_finite() {
            return Err(VmlError::invalid("learning rate must be a finite number"));
        }
        if !reg.is_finite() {
            return Err(VmlError::invalid("regularization must be a finite number"));
        }

        let n = self.phi.nrows() as f64;
        let mut grad = vec![0.0; self.weights.len()];
        for (row, t) in self.phi.rows().zip(&self.targets) {
            let residual = t - dot(&self.weights, row)?;
            for (g, p) in grad.iter_mut().zip(row) {
                *g += p * residual;
            }
        }
        grad.iter_mut().for_each(|g| *g *= -1.0 / n);

        if let Some(threshold) = clip {
            grad = gradient_clipping(grad, threshold);
        }

        for (w, g) in self.weights.iter_mut().zip(&grad) {
            let total = g + w.abs() * reg;
            *w -= learning_rate * total;
        }
        Ok(())
    }

    /// Half the residual sum of squares.
    pub fn compute_error(&self) -> Result<f64> {
        self.ensure_ready()?;
        let mut rss = 0.0;
        for (row, t) in self.phi.rows().zip(&self.targets) {
            rss += (t - dot(&self.weights, row)?).powi(2);
        }
        Ok(0.5 * rss)
    }

    pub fn predict_value(&self, x: f64) -> Result<f64> {
        self.ensure_ready()?;
        dot(&self.weights, &polynomial_phi(x, self.degree))
    }
}

impl Model for PolynomialRegression {
    fn name(&self) -> &'static str {
        "polynomial_regression"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        check_point_dim("PolynomialRegression::predict", 1, x)?;
        self.predict_value(x[0]).map(Prediction::Value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::linalg::norm;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn line() -> (Vec<f64>, Vec<f64>) {
        let xs = vec![-2.0, -1.0, 0.0, 1.0, 2.0, 3.0];
        let ys = xs.iter().map(|x| 0.5 * x - 1.0).collect();
        (xs, ys)
    }

    #[test]
    fn test_unregularized_fit_is_ordinary_least_squares() {
        let mut rng = StdRng::seed_from_u64(3);
        let (xs, ys) = line();
        let mut model = PolynomialRegression::new();
        model.init(1, &xs, &ys, &mut rng).unwrap();
        model.fit(0.0).unwrap();
        assert_abs_diff_eq!(model.weights()[0], -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(model.weights()[1], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(model.compute_error().unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_regularization_shrinks_weights() {
        let mut rng = StdRng::seed_from_u64(3);
        let (xs, ys) = line();
        let mut model = PolynomialRegression::new();
        model.init(1, &xs, &ys, &mut rng).unwrap();

        let mut previous = f64::INFINITY;
        for reg in [0.0, 0.5, 2.0, 10.0, 100.0] {
            model.fit(reg).unwrap();
            let n = norm(model.weights());
            assert!(n < previous, "norm {} not below {}", n, previous);
            previous = n;
        }
    }

    #[test]
    fn test_degree_zero_fits_the_mean() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut model = PolynomialRegression::new();
        model.init(0, &[1.0, 2.0, 3.0], &[2.0, 4.0, 9.0], &mut rng).unwrap();
        assert_eq!(model.weights().len(), 1);
        model.fit(0.0).unwrap();
        assert_abs_diff_eq!(model.predict_value(42.0).unwrap(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gradient_descent_reduces_error() {
        let mut rng = StdRng::seed_from_u64(11);
        let (xs, ys) = line();
        let mut model = PolynomialRegression::new();
        model.init(1, &xs, &ys, &mut rng).unwrap();
        let before = model.compute_error().unwrap();
        for _ in 0..200 {
            model
                .update_weights(0.05, 0.0, Some(DEFAULT_CLIP_THRESHOLD))
                .unwrap();
        }
        assert!(model.compute_error().unwrap() < before);
    }

    #[test]
    fn test_not_ready() {
        let model = PolynomialRegression::new();
        assert!(matches!(model.predict(&[1.0]), Err(VmlError::NotReady(_))));
    }
}
