//! Gaussian densities shared by the probabilistic models.
//!
//! The univariate density is delegated to `statrs`; the multivariate one is
//! computed directly from the covariance determinant and inverse so that a
//! singular covariance can be reported as "probability 0" instead of failing.
use std::f64::consts::PI;

use statrs::distribution::{Continuous, Normal};

use crate::error::{Result, VmlError};
use crate::math::linalg::{determinant, inverse, quadratic_form, sub};
use crate::math::Array2;

/// A one-dimensional Gaussian fitted with the unbiased (N-1) variance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnivariateGaussian {
    pub mean: f64,
    pub variance: f64,
}

impl UnivariateGaussian {
    /// Fit mean and sample variance to `values`.
    ///
    /// Needs at least two values; a zero variance is reported as
    /// `DegenerateNumeric` since the density would be undefined.
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.len() < 2 {
            return Err(VmlError::invalid(format!(
                "need at least 2 values to fit a variance, got {}",
                values.len()
            )));
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        if variance <= 0.0 || !variance.is_finite() {
            return Err(VmlError::DegenerateNumeric(format!(
                "zero variance feature (mean {})",
                mean
            )));
        }
        Ok(Self { mean, variance })
    }

    pub fn pdf(&self, x: f64) -> Result<f64> {
        univariate_normal_pdf(x, self.mean, self.variance)
    }
}

pub fn univariate_normal_pdf(x: f64, mean: f64, variance: f64) -> Result<f64> {
    let normal = Normal::new(mean, variance.sqrt()).map_err(|e| {
        VmlError::DegenerateNumeric(format!("invalid gaussian (variance {}): {}", variance, e))
    })?;
    Ok(normal.pdf(x))
}

/// Multivariate normal density `N(x; mean, cov)`.
///
/// Returns `0.0` when `cov` is singular (determinant 0), which callers treat
/// as a degenerate distribution that assigns no probability.
pub fn multivariate_normal_pdf(x: &[f64], mean: &[f64], cov: &Array2<f64>) -> Result<f64> {
    let diff = sub(x, mean)?;
    let det = determinant(cov)?;
    if det <= 0.0 {
        return Ok(0.0);
    }
    let cov_inv = inverse(cov)?;
    let mahalanobis = quadratic_form(&diff, &cov_inv)?;
    let d = x.len() as f64;
    Ok((2.0 * PI).powf(-0.5 * d) * det.powf(-0.5) * (-0.5 * mahalanobis).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fit_uses_sample_variance() {
        let g = UnivariateGaussian::fit(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_relative_eq!(g.mean, 2.5);
        assert_relative_eq!(g.variance, 5.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_variance_is_degenerate() {
        assert!(matches!(
            UnivariateGaussian::fit(&[2.0, 2.0, 2.0]),
            Err(VmlError::DegenerateNumeric(_))
        ));
    }

    #[test]
    fn test_standard_normal_peak() {
        let p = univariate_normal_pdf(0.0, 0.0, 1.0).unwrap();
        assert_relative_eq!(p, 1.0 / (2.0 * PI).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_multivariate_matches_product_of_independent_normals() {
        let cov = Array2::from_diag(&[1.0, 4.0]);
        let p = multivariate_normal_pdf(&[0.5, -1.0], &[0.0, 0.0], &cov).unwrap();
        let expected = univariate_normal_pdf(0.5, 0.0, 1.0).unwrap()
            * univariate_normal_pdf(-1.0, 0.0, 4.0).unwrap();
        assert_relative_eq!(p, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_covariance_has_zero_density() {
        let cov = Array2::zeros(2, 2);
        assert_eq!(multivariate_normal_pdf(&[0.0, 0.0], &[0.0, 0.0], &cov).unwrap(), 0.0);
    }
}
