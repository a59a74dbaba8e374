//! Kernel SVM in the dual, trained by stochastic single-coordinate ascent.
//!
//! Each step moves one dual coefficient along the gradient of the dual
//! objective and projects it back onto `[0, C]`. The equality constraint
//! `sum_i alpha_i y_i = 0` of the full SMO problem is not enforced, and the
//! model has no separate bias term.
use rand::RngCore;

use crate::dataset::{check_labels_match, check_non_empty, check_point_dim, Polarity};
use crate::error::{Result, VmlError};
use crate::math::Array2;
use crate::models::kernels::Kernel;
use crate::models::model_trait::{Model, Prediction};
use crate::models::utils::{random_index, two_class_from_margin};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportVector {
    pub index: usize,
    pub alpha: f64,
    pub label: Polarity,
}

#[derive(Default)]
pub struct Svm {
    data: Array2<f64>,
    labels: Vec<Polarity>,
    alphas: Vec<f64>,
    c: f64,
    kernel: Option<Box<dyn Kernel>>,
    support: Vec<SupportVector>,
    ready: bool,
}

impl std::fmt::Debug for Svm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Svm")
            .field("samples", &self.data.nrows())
            .field("c", &self.c)
            .field("support_vectors", &self.support.len())
            .field("ready", &self.ready)
            .finish()
    }
}

impl Svm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the data and start from all-zero coefficients.
    pub fn init(
        &mut self,
        x: &Array2<f64>,
        labels: &[Polarity],
        c: f64,
        kernel: Box<dyn Kernel>,
    ) -> Result<()> {
        check_non_empty("Svm::init", x)?;
        check_labels_match("Svm::init", x, labels.len())?;
        if !(c.is_finite() && c > 0.0) {
            return Err(VmlError::invalid(format!("C must be positive, got {}", c)));
        }
        self.data = x.clone();
        self.labels = labels.to_vec();
        self.alphas = vec![0.0; x.nrows()];
        self.c = c;
        self.kernel = Some(kernel);
        self.support.clear();
        self.ready = true;
        Ok(())
    }

    fn kernel(&self) -> Result<&dyn Kernel> {
        match (&self.kernel, self.ready) {
            (Some(k), true) => Ok(k.as_ref()),
            _ => Err(VmlError::NotReady("svm")),
        }
    }

    pub fn alphas(&self) -> &[f64] {
        &self.alphas
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    /// `sum_j alpha_j y_j k(x_j, x)` over all samples with non-zero alpha.
    fn decision(&self, x: &[f64]) -> Result<f64> {
        let kernel = self.kernel()?;
        let mut sum = 0.0;
        for (i, (&alpha, label)) in self.alphas.iter().zip(&self.labels).enumerate() {
            if alpha != 0.0 {
                sum += alpha * label.as_f64() * kernel.compute(self.data.row(i), x)?;
            }
        }
        Ok(sum)
    }

    /// Pick one sample `i` and set
    /// `alpha_i = clip(alpha_i + lr * (1 - y_i * sum_j alpha_j y_j k(x_i, x_j)), 0, C)`.
    pub fn fit_step(&mut self, learning_rate: f64, rng: &mut dyn RngCore) -> Result<()> {
        self.kernel()?;
        if !learning_rate.is_finite() {
            return Err(VmlError::invalid(format!(
                "learning rate must be a finite number, got {}",
                learning_rate
            )));
        }
        let i = random_index(rng, self.alphas.len());
        let margin = self.labels[i].as_f64() * self.decision(self.data.row(i))?;
        let updated = self.alphas[i] + learning_rate * (1.0 - margin);
        self.alphas[i] = updated.clamp(0.0, self.c);
        log::trace!("svm alpha[{}] = {}", i, self.alphas[i]);
        Ok(())
    }

    /// Dual objective `sum_i alpha_i - 1/2 sum_ij alpha_i alpha_j y_i y_j k(x_i, x_j)`.
    /// Larger is better.
    pub fn compute_error(&self) -> Result<f64> {
        let kernel = self.kernel()?;
        let mut quad = 0.0;
        for (i, (&ai, yi)) in self.alphas.iter().zip(&self.labels).enumerate() {
            if ai == 0.0 {
                continue;
            }
            for (j, (&aj, yj)) in self.alphas.iter().zip(&self.labels).enumerate() {
                if aj == 0.0 {
                    continue;
                }
                quad += ai * aj * yi.as_f64() * yj.as_f64()
                    * kernel.compute(self.data.row(i), self.data.row(j))?;
            }
        }
        Ok(self.alphas.iter().sum::<f64>() - 0.5 * quad)
    }

    /// Refresh and return the cached support vectors (samples with non-zero alpha).
    pub fn get_support_vectors(&mut self) -> Result<&[SupportVector]> {
        self.kernel()?;
        self.support = self
            .alphas
            .iter()
            .zip(&self.labels)
            .enumerate()
            .filter(|&(_, (&alpha, _))| alpha != 0.0)
            .map(|(index, (&alpha, &label))| SupportVector {
                index,
                alpha,
                label,
            })
            .collect();
        Ok(&self.support)
    }

    /// Support vectors as of the last [`Svm::get_support_vectors`] call.
    pub fn support_vectors(&self) -> &[SupportVector] {
        &self.support
    }

    /// Classify `x` as `[positive, negative]` using the cached support vectors,
    /// refreshing them first when `recompute` is set. A zero decision value
    /// gives `[0.5, 0.5]`.
    pub fn predict_cached(&mut self, x: &[f64], recompute: bool) -> Result<Vec<f64>> {
        if recompute {
            self.get_support_vectors()?;
        }
        let kernel = self.kernel()?;
        check_point_dim("Svm::predict", self.data.ncols(), x)?;
        let mut sum = 0.0;
        for sv in &self.support {
            sum += sv.alpha * sv.label.as_f64() * kernel.compute(self.data.row(sv.index), x)?;
        }
        Ok(two_class_from_margin(sum))
    }

    /// Same as `predict_cached(x, true)` without touching the cache.
    pub fn predict_scores(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.kernel()?;
        check_point_dim("Svm::predict", self.data.ncols(), x)?;
        Ok(two_class_from_margin(self.decision(x)?))
    }
}

impl Model for Svm {
    fn name(&self) -> &'static str {
        "svm"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        self.predict_scores(x).map(Prediction::Probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::kernels::KernelConfig;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn separable() -> (Array2<f64>, Vec<Polarity>) {
        let x = Array2::from_rows(&[
            [2.0, 2.0],
            [3.0, 1.0],
            [2.5, 3.0],
            [-2.0, -2.0],
            [-3.0, -1.0],
            [-1.5, -2.5],
        ])
        .unwrap();
        let labels = [Polarity::Positive; 3]
            .into_iter()
            .chain([Polarity::Negative; 3])
            .collect();
        (x, labels)
    }

    #[test]
    fn test_alphas_stay_in_box() {
        let mut rng = StdRng::seed_from_u64(17);
        let rows: Vec<[f64; 2]> = (0..20)
            .map(|_| [rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0)])
            .collect();
        let labels: Vec<Polarity> = (0..20)
            .map(|i| if i % 3 == 0 { Polarity::Positive } else { Polarity::Negative })
            .collect();
        let x = Array2::from_rows(&rows).unwrap();

        for kernel in [
            KernelConfig::Gaussian { sigma: 1.0 },
            KernelConfig::Polynomial { degree: 3, bias: 1.0 },
        ] {
            let mut svm = Svm::new();
            svm.init(&x, &labels, 0.7, Box::new(kernel)).unwrap();
            for _ in 0..500 {
                svm.fit_step(0.8, &mut rng).unwrap();
                assert!(svm.alphas().iter().all(|&a| (0.0..=0.7).contains(&a)));
            }
        }
    }

    #[test]
    fn test_learns_separable_data() {
        let mut rng = StdRng::seed_from_u64(3);
        let (x, labels) = separable();
        let mut svm = Svm::new();
        svm.init(&x, &labels, 10.0, Box::new(KernelConfig::Linear { bias: 1.0 }))
            .unwrap();
        assert_eq!(svm.compute_error().unwrap(), 0.0);
        for _ in 0..500 {
            svm.fit_step(0.01, &mut rng).unwrap();
        }
        assert!(svm.compute_error().unwrap() > 0.0);

        let n_support = svm.get_support_vectors().unwrap().len();
        assert!(n_support > 0);
        assert_eq!(svm.support_vectors().len(), n_support);

        for (row, label) in x.rows().zip(&labels) {
            let expected = if *label == Polarity::Positive {
                vec![1.0, 0.0]
            } else {
                vec![0.0, 1.0]
            };
            assert_eq!(svm.predict_cached(row, false).unwrap(), expected);
            assert_eq!(svm.predict_scores(row).unwrap(), expected);
        }
    }

    #[test]
    fn test_untrained_model_is_undecided() {
        let (x, labels) = separable();
        let mut svm = Svm::new();
        assert!(matches!(svm.predict(&[0.0, 0.0]), Err(VmlError::NotReady(_))));
        svm.init(&x, &labels, 1.0, Box::new(KernelConfig::default()))
            .unwrap();
        assert_eq!(svm.predict_cached(&[1.0, 1.0], true).unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_injected_kernel() {
        let mut rng = StdRng::seed_from_u64(1);
        let (x, labels) = separable();
        let mut svm = Svm::new();
        let kernel = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(p, q)| p * q).sum::<f64>();
        svm.init(&x, &labels, 1.0, Box::new(kernel)).unwrap();
        for _ in 0..200 {
            svm.fit_step(0.05, &mut rng).unwrap();
        }
        assert_eq!(svm.predict_scores(&[4.0, 4.0]).unwrap(), vec![1.0, 0.0]);
        assert!(svm.init(&x, &labels, 0.0, Box::new(kernel)).is_err());
    }
}
