//! Gaussian mixture model with full covariances, fitted by expectation
//! maximization.
use rand::RngCore;

use crate::dataset::{check_non_empty, check_point_dim};
use crate::error::{Result, VmlError};
use crate::math::linalg::{determinant, outer_product, sub};
use crate::math::Array2;
use crate::models::model_trait::{Model, Prediction};
use crate::models::utils::{nearest_row, random_index};
use crate::stats::multivariate_normal_pdf;

/// Upper bound on random restarts of [`GaussianMixture::init`].
pub const MAX_INIT_ATTEMPTS: usize = 100;

/// Factor applied by [`GaussianMixture::display_density`] before clamping to 1.
pub const DISPLAY_SCALE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GaussianComponent {
    pub weight: f64,
    pub mean: Vec<f64>,
    pub cov: Array2<f64>,
}

impl GaussianComponent {
    fn weighted_pdf(&self, x: &[f64]) -> Result<f64> {
        Ok(self.weight * multivariate_normal_pdf(x, &self.mean, &self.cov)?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GaussianMixture {
    data: Array2<f64>,
    components: Vec<GaussianComponent>,
    ready: bool,
}

impl GaussianMixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed every component at a random sample, assign each sample to its
    /// nearest seed and start from the per-group mean and covariance with
    /// equal weights. Restarts while any covariance is singular, up to
    /// [`MAX_INIT_ATTEMPTS`] times.
    pub fn init(
        &mut self,
        x: &Array2<f64>,
        num_components: usize,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        check_non_empty("GaussianMixture::init", x)?;
        if num_components == 0 {
            return Err(VmlError::invalid("number of components must be at least 1"));
        }

        for attempt in 1..=MAX_INIT_ATTEMPTS {
            if let Some(components) = bootstrap(x, num_components, rng)? {
                log::debug!(
                    "gaussian mixture initialized with {} components after {} attempt(s)",
                    num_components,
                    attempt
                );
                self.data = x.clone();
                self.components = components;
                self.ready = true;
                return Ok(());
            }
            log::warn!("gaussian mixture init attempt {} produced a singular covariance", attempt);
        }
        Err(VmlError::DegenerateInitialization {
            attempts: MAX_INIT_ATTEMPTS,
        })
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(VmlError::NotReady("gaussian mixture"))
        }
    }

    pub fn components(&self) -> &[GaussianComponent] {
        &self.components
    }

    /// Posterior component probabilities for one point. A point no component
    /// assigns any density to gets uniform responsibilities.
    fn point_responsibilities(&self, x: &[f64]) -> Result<Vec<f64>> {
        let weighted = self
            .components
            .iter()
            .map(|c| c.weighted_pdf(x))
            .collect::<Result<Vec<_>>>()?;
        let total: f64 = weighted.iter().sum();
        if total > 0.0 && total.is_finite() {
            Ok(weighted.into_iter().map(|w| w / total).collect())
        } else {
            let k = self.components.len() as f64;
            Ok(vec![1.0 / k; self.components.len()])
        }
    }

    /// E-step: one row per sample, one column per component.
    pub fn responsibilities(&self) -> Result<Vec<Vec<f64>>> {
        self.ensure_ready()?;
        self.data
            .rows()
            .map(|row| self.point_responsibilities(row))
            .collect()
    }

    /// One EM iteration. A component that collects no responsibility at all
    /// keeps its mean and covariance and drops to weight 0.
    pub fn fit_step(&mut self) -> Result<()> {
        let resp = self.responsibilities()?;
        let n = self.data.nrows() as f64;
        let dim = self.data.ncols();

        for (k, component) in self.components.iter_mut().enumerate() {
            let n_k: f64 = resp.iter().map(|r| r[k]).sum();
            if n_k <= 0.0 {
                log::warn!("gaussian mixture component {} is empty", k);
                component.weight = 0.0;
                continue;
            }

            let mut mean = vec![0.0; dim];
            for (row, r) in self.data.rows().zip(&resp) {
                for (m, v) in mean.iter_mut().zip(row) {
                    *m += r[k] * v;
                }
            }
            mean.iter_mut().for_each(|m| *m /= n_k);

            let mut cov = Array2::zeros(dim, dim);
            for (row, r) in self.data.rows().zip(&resp) {
                let diff = sub(row, &mean)?;
                let outer = outer_product(&diff, &diff);
                for (c, o) in cov.as_mut_slice().iter_mut().zip(outer.as_slice()) {
                    *c += r[k] * o;
                }
            }
            cov.as_mut_slice().iter_mut().for_each(|c| *c /= n_k);

            component.mean = mean;
            component.cov = cov;
            component.weight = n_k / n;
        }
        Ok(())
    }

    /// Mixture density `sum_k weight_k * N(x; mean_k, cov_k)`.
    pub fn density(&self, x: &[f64]) -> Result<f64> {
        self.ensure_ready()?;
        check_point_dim("GaussianMixture::density", self.data.ncols(), x)?;
        let mut total = 0.0;
        for c in &self.components {
            total += c.weighted_pdf(x)?;
        }
        Ok(total)
    }

    /// Density stretched for plotting: `min(DISPLAY_SCALE * density, 1)`.
    pub fn display_density(&self, x: &[f64]) -> Result<f64> {
        Ok((self.density(x)? * DISPLAY_SCALE).min(1.0))
    }

    /// `sum_i ln density(x_i)`; `-inf` when some sample has zero density.
    pub fn log_likelihood(&self) -> Result<f64> {
        self.ensure_ready()?;
        let mut total = 0.0;
        for row in self.data.rows() {
            total += self.density(row)?.ln();
        }
        Ok(total)
    }
}

/// One initialization attempt; `None` when a covariance comes out singular.
fn bootstrap(
    x: &Array2<f64>,
    num_components: usize,
    rng: &mut dyn RngCore,
) -> Result<Option<Vec<GaussianComponent>>> {
    let dim = x.ncols();
    let seeds: Vec<Vec<f64>> = (0..num_components)
        .map(|_| x.row(random_index(rng, x.nrows())).to_vec())
        .collect();

    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); num_components];
    for (i, row) in x.rows().enumerate() {
        groups[nearest_row(&seeds, row)?].push(i);
    }

    let mut components = Vec::with_capacity(num_components);
    for group in &groups {
        if group.is_empty() {
            return Ok(None);
        }
        let count = group.len() as f64;
        let mut mean = vec![0.0; dim];
        for &i in group {
            for (m, v) in mean.iter_mut().zip(x.row(i)) {
                *m += v / count;
            }
        }
        let mut cov = Array2::zeros(dim, dim);
        for &i in group {
            let diff = sub(x.row(i), &mean)?;
            let outer = outer_product(&diff, &diff);
            for (c, o) in cov.as_mut_slice().iter_mut().zip(outer.as_slice()) {
                *c += o / count;
            }
        }
        if determinant(&cov)? == 0.0 {
            return Ok(None);
        }
        components.push(GaussianComponent {
            weight: 1.0 / num_components as f64,
            mean,
            cov,
        });
    }
    Ok(Some(components))
}

impl Model for GaussianMixture {
    fn name(&self) -> &'static str {
        "gaussian_mixture"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        self.density(x).map(Prediction::Density)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_clusters() -> Array2<f64> {
        let offsets = [
            (0.0, 0.0),
            (0.5, 0.2),
            (-0.4, 0.3),
            (0.2, -0.5),
            (-0.3, -0.2),
            (0.6, 0.6),
        ];
        let mut rows = Vec::new();
        for (cx, cy) in [(-3.0, -2.0), (3.0, 2.5)] {
            for (dx, dy) in offsets {
                rows.push([cx + dx, cy + dy]);
            }
        }
        Array2::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_responsibilities_sum_to_one() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut gmm = GaussianMixture::new();
        gmm.init(&two_clusters(), 2, &mut rng).unwrap();
        for _ in 0..5 {
            for r in gmm.responsibilities().unwrap() {
                assert_relative_eq!(r.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
            }
            gmm.fit_step().unwrap();
        }
        let weights: f64 = gmm.components().iter().map(|c| c.weight).sum();
        assert_relative_eq!(weights, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_em_does_not_decrease_log_likelihood() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut gmm = GaussianMixture::new();
        gmm.init(&two_clusters(), 2, &mut rng).unwrap();
        let mut previous = gmm.log_likelihood().unwrap();
        for _ in 0..10 {
            gmm.fit_step().unwrap();
            let current = gmm.log_likelihood().unwrap();
            assert!(current >= previous - 1e-6, "{} < {}", current, previous);
            previous = current;
        }
    }

    #[test]
    fn test_identical_points_fail_initialization() {
        let mut rng = StdRng::seed_from_u64(1);
        let x = Array2::from_rows(&[[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]]).unwrap();
        let mut gmm = GaussianMixture::new();
        assert_eq!(
            gmm.init(&x, 1, &mut rng),
            Err(VmlError::DegenerateInitialization {
                attempts: MAX_INIT_ATTEMPTS
            })
        );
        assert!(!gmm.is_ready());
    }

    #[test]
    fn test_zero_density_gives_negative_infinity_and_uniform_responsibilities() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut gmm = GaussianMixture::new();
        gmm.init(&two_clusters(), 2, &mut rng).unwrap();
        for c in gmm.components.iter_mut() {
            c.cov = Array2::zeros(2, 2);
        }
        assert_eq!(gmm.log_likelihood().unwrap(), f64::NEG_INFINITY);
        for r in gmm.responsibilities().unwrap() {
            assert_eq!(r, vec![0.5, 0.5]);
        }
    }

    #[test]
    fn test_display_density_is_clamped() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut gmm = GaussianMixture::new();
        gmm.init(&two_clusters(), 2, &mut rng).unwrap();
        let centre = gmm.components()[0].mean.clone();
        let raw = gmm.density(&centre).unwrap();
        let shown = gmm.display_density(&centre).unwrap();
        assert!(raw > 0.0);
        assert_relative_eq!(shown, (raw * DISPLAY_SCALE).min(1.0));
        assert!(gmm.display_density(&[100.0, -100.0]).unwrap() < 1e-12);
    }
}
