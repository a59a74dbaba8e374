//! Bayesian linear regression with a zero-mean isotropic Gaussian prior.
//!
//! Inputs are used as given: callers that want a bias or polynomial terms pass
//! already transformed feature vectors (see [`crate::preprocessing`]).
use crate::dataset::{check_labels_match, check_non_empty, check_point_dim};
use crate::error::{Result, VmlError};
use crate::math::linalg::{
    dot, inverse, mat_add, mat_mat_mul, mat_vec_mul, quadratic_form, ridge_solve,
    scalar_multiply, transpose,
};
use crate::math::Array2;
use crate::models::model_trait::{Model, Prediction};
use crate::stats::multivariate_normal_pdf;

#[derive(Debug, Clone, Default)]
pub struct BayesianLinearRegression {
    phi: Array2<f64>,
    targets: Vec<f64>,
    alpha: f64,
    beta: f64,
    /// Posterior mean of the weights.
    posterior_mean: Vec<f64>,
    /// Posterior covariance `(alpha I + beta Phi^T Phi)^-1`.
    posterior_cov: Array2<f64>,
    map_weights: Vec<f64>,
    ready: bool,
}

impl BayesianLinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the weight posterior and the MAP (ridge, `lambda = alpha / beta`)
    /// solution. `alpha` is the prior precision, `beta` the noise precision.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[f64], alpha: f64, beta: f64) -> Result<()> {
        check_non_empty("BayesianLinearRegression::fit", x)?;
        check_labels_match("BayesianLinearRegression::fit", x, y.len())?;
        for (name, v) in [("alpha", alpha), ("beta", beta)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(VmlError::invalid(format!(
                    "{} must be a positive precision, got {}",
                    name, v
                )));
            }
        }

        let phi_t = transpose(x);
        let gram = mat_mat_mul(&phi_t, x)?;
        let prior = Array2::from_diag(&vec![alpha; x.ncols()]);
        let posterior_cov = inverse(&mat_add(&prior, &scalar_multiply(&gram, beta))?)?;
        let posterior_mean = mat_vec_mul(&posterior_cov, &mat_vec_mul(&phi_t, y)?)?
            .into_iter()
            .map(|v| v * beta)
            .collect();
        let map_weights = ridge_solve(x, y, alpha / beta)?;

        self.phi = x.clone();
        self.targets = y.to_vec();
        self.alpha = alpha;
        self.beta = beta;
        self.posterior_cov = posterior_cov;
        self.posterior_mean = posterior_mean;
        self.map_weights = map_weights;
        self.ready = true;

        log::debug!(
            "bayesian linear regression fitted on {} samples (alpha={}, beta={})",
            x.nrows(),
            alpha,
            beta
        );
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(VmlError::NotReady("bayesian linear regression"))
        }
    }

    pub fn posterior_mean(&self) -> &[f64] {
        &self.posterior_mean
    }

    pub fn posterior_cov(&self) -> &Array2<f64> {
        &self.posterior_cov
    }

    pub fn map_weights(&self) -> &[f64] {
        &self.map_weights
    }

    /// Point prediction with the MAP weights.
    pub fn pred_map(&self, x: &[f64]) -> Result<f64> {
        self.ensure_ready()?;
        check_point_dim("BayesianLinearRegression::pred_map", self.phi.ncols(), x)?;
        dot(&self.map_weights, x)
    }

    /// Mean and variance of the predictive distribution at `x`.
    pub fn predictive_moments(&self, x: &[f64]) -> Result<(f64, f64)> {
        self.ensure_ready()?;
        check_point_dim("BayesianLinearRegression::pred_dist", self.phi.ncols(), x)?;
        let mean = dot(&self.posterior_mean, x)?;
        let variance = quadratic_form(x, &self.posterior_cov)? + 1.0 / self.beta;
        Ok((mean, variance))
    }

    /// Predictive density at `x`, evaluated at every target value in `range`.
    pub fn pred_dist(&self, x: &[f64], range: &[f64]) -> Result<Vec<f64>> {
        let (mean, variance) = self.predictive_moments(x)?;
        let cov = Array2::from_elem(1, 1, variance);
        range
            .iter()
            .map(|&v| gauss_dist_multi_dim(&[v], &[mean], &cov))
            .collect()
    }

    /// `-beta/2 * sum_i (t_i - w . x_i)^2` over the training data.
    pub fn log_likelihood(&self, weights: &[f64]) -> Result<f64> {
        self.ensure_ready()?;
        let mut sse = 0.0;
        for (row, t) in self.phi.rows().zip(&self.targets) {
            sse += (t - dot(weights, row)?).powi(2);
        }
        Ok(-0.5 * self.beta * sse)
    }

    /// Log posterior up to a constant: the log-likelihood plus the Gaussian
    /// prior term `-alpha/2 * w . w`.
    pub fn log_posterior(&self, weights: &[f64]) -> Result<f64> {
        let ll = self.log_likelihood(weights)?;
        Ok(ll - 0.5 * self.alpha * dot(weights, weights)?)
    }
}

/// Multivariate Gaussian density; 0 for a singular covariance.
pub fn gauss_dist_multi_dim(x: &[f64], mean: &[f64], cov: &Array2<f64>) -> Result<f64> {
    multivariate_normal_pdf(x, mean, cov)
}

impl Model for BayesianLinearRegression {
    fn name(&self) -> &'static str {
        "bayesian_linear_regression"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        self.pred_map(x).map(Prediction::Value)
    }
}
