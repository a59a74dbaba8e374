//! Two-class Gaussian naive Bayes with equal priors.
use crate::dataset::check_point_dim;
use crate::error::{Result, VmlError};
use crate::math::Array2;
use crate::models::model_trait::{Model, Prediction};
use crate::stats::UnivariateGaussian;

const PRIOR_A: f64 = 0.5;
const PRIOR_B: f64 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct NaiveBayes {
    dist_a: Vec<UnivariateGaussian>,
    dist_b: Vec<UnivariateGaussian>,
    ready: bool,
}

fn fit_features(op: &'static str, x: &Array2<f64>) -> Result<Vec<UnivariateGaussian>> {
    (0..x.ncols())
        .map(|c| {
            UnivariateGaussian::fit(&x.column(c))
                .map_err(|e| VmlError::DegenerateNumeric(format!("{}: feature {}: {}", op, c, e)))
        })
        .collect()
}

impl NaiveBayes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit one Gaussian per feature and class. Each class needs at least two
    /// samples, and no feature may be constant within a class.
    pub fn fit(&mut self, class_a: &Array2<f64>, class_b: &Array2<f64>) -> Result<()> {
        if class_a.ncols() != class_b.ncols() {
            return Err(VmlError::dims(
                "NaiveBayes::fit",
                format!("class B with {} features", class_a.ncols()),
                format!("{} features", class_b.ncols()),
            ));
        }
        for (name, x) in [("class A", class_a), ("class B", class_b)] {
            if x.nrows() < 2 {
                return Err(VmlError::invalid(format!(
                    "{} needs at least 2 samples, got {}",
                    name,
                    x.nrows()
                )));
            }
        }
        let dist_a = fit_features("class A", class_a)?;
        let dist_b = fit_features("class B", class_b)?;
        self.dist_a = dist_a;
        self.dist_b = dist_b;
        self.ready = true;
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(VmlError::NotReady("naive bayes"))
        }
    }

    pub fn class_a(&self) -> &[UnivariateGaussian] {
        &self.dist_a
    }

    pub fn class_b(&self) -> &[UnivariateGaussian] {
        &self.dist_b
    }

    /// Posterior `[p(A | x), p(B | x)]`.
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.ensure_ready()?;
        check_point_dim("NaiveBayes::predict", self.dist_a.len(), x)?;
        let mut a = PRIOR_A;
        let mut b = PRIOR_B;
        for ((da, db), &v) in self.dist_a.iter().zip(&self.dist_b).zip(x) {
            a *= da.pdf(v)?;
            b *= db.pdf(v)?;
        }
        let total = a + b;
        if total <= 0.0 || !total.is_finite() {
            return Err(VmlError::DegenerateNumeric(format!(
                "both class likelihoods vanish at {:?}",
                x
            )));
        }
        Ok(vec![a / total, b / total])
    }
}

impl Model for NaiveBayes {
    fn name(&self) -> &'static str {
        "naive_bayes"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        self.predict_proba(x).map(Prediction::Probabilities)
    }
}
