//! Goodness-of-fit metrics for trained models.
//!
//! Both evaluators work on predictions collected up front, either handed in
//! directly or gathered from a [`Model`] over a [`Dataset`].
use serde::Serialize;

use crate::dataset::{ClassLabels, Dataset};
use crate::error::{Result, VmlError};
use crate::models::model_trait::{Model, Prediction};
use crate::models::utils::argmax;

/// Default relative tolerance of [`RegressionEvaluation::acp`].
pub const DEFAULT_ACP_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub rmse: f64,
    /// `None` when some label is zero.
    pub mape: Option<f64>,
    pub acp: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionEvaluation {
    predictions: Vec<f64>,
    labels: Vec<f64>,
}

impl RegressionEvaluation {
    pub fn new(predictions: Vec<f64>, labels: Vec<f64>) -> Result<Self> {
        if predictions.len() != labels.len() {
            return Err(VmlError::dims(
                "RegressionEvaluation::new",
                format!("{} predictions", labels.len()),
                format!("{} predictions", predictions.len()),
            ));
        }
        if labels.is_empty() {
            return Err(VmlError::invalid("cannot evaluate on an empty dataset"));
        }
        Ok(Self {
            predictions,
            labels,
        })
    }

    /// Predict every sample of `data` and compare against its labels.
    pub fn from_model<M: Model + ?Sized>(model: &M, data: &Dataset) -> Result<Self> {
        let predictions = data
            .x
            .rows()
            .map(|row| model.predict(row).map(|p| p.value()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(predictions, data.y.clone())
    }

    fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.predictions.iter().copied().zip(self.labels.iter().copied())
    }

    fn n(&self) -> f64 {
        self.labels.len() as f64
    }

    pub fn rmse(&self) -> f64 {
        let sse: f64 = self.pairs().map(|(p, t)| (p - t).powi(2)).sum();
        (sse / self.n()).sqrt()
    }

    /// Mean absolute percentage error. Undefined when any label is zero.
    pub fn mape(&self) -> Result<f64> {
        let mut sum = 0.0;
        for (i, (p, t)) in self.pairs().enumerate() {
            if t == 0.0 {
                return Err(VmlError::DegenerateNumeric(format!(
                    "MAPE is undefined: label {} is zero",
                    i
                )));
            }
            sum += ((t - p) / t).abs();
        }
        Ok(sum / self.n())
    }

    /// Share of "almost correct" predictions, those whose relative error is
    /// below `threshold`. A zero label never counts as almost correct.
    pub fn acp(&self, threshold: f64) -> f64 {
        let hits = self
            .pairs()
            .filter(|&(p, t)| ((t - p) / t).abs() < threshold)
            .count();
        hits as f64 / self.n()
    }

    pub fn all_metrics(&self) -> RegressionMetrics {
        RegressionMetrics {
            rmse: self.rmse(),
            mape: self.mape().ok(),
            acp: self.acp(DEFAULT_ACP_THRESHOLD),
        }
    }
}

/// Binary confusion counts. Class 1 is the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_negatives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    num as f64 / den as f64
}

fn rate(metric: &str, num: usize, den: usize) -> Result<f64> {
    if den == 0 {
        return Err(VmlError::DegenerateNumeric(format!(
            "{} is undefined: zero denominator",
            metric
        )));
    }
    Ok(ratio(num, den))
}

impl ConfusionMatrix {
    /// Fails when nothing was predicted positive.
    pub fn precision(&self) -> Result<f64> {
        rate("precision", self.true_positives, self.true_positives + self.false_positives)
    }

    /// Fails when there are no positive samples.
    pub fn recall(&self) -> Result<f64> {
        rate("recall", self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Fails when there are no negative samples.
    pub fn fall_out(&self) -> Result<f64> {
        rate("fall-out", self.false_positives, self.false_positives + self.true_negatives)
    }

    pub fn f1(&self) -> Result<f64> {
        let p = self.precision()?;
        let r = self.recall()?;
        if p + r == 0.0 {
            return Err(VmlError::DegenerateNumeric(
                "f1 is undefined: precision and recall are both 0".to_string(),
            ));
        }
        Ok(2.0 * p * r / (p + r))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierMetrics {
    pub accuracy: f64,
    pub avg_per_class_accuracy: f64,
    pub per_class_accuracy: Vec<Option<f64>>,
    pub log_loss: f64,
    /// Only filled in for two-class problems.
    pub confusion_matrix: Option<ConfusionMatrix>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierEvaluation {
    probabilities: Vec<Vec<f64>>,
    predicted: Vec<usize>,
    labels: ClassLabels,
}

impl ClassifierEvaluation {
    /// `probabilities[i]` holds one score per class for sample `i`; the
    /// predicted class is the first maximum.
    pub fn new(probabilities: Vec<Vec<f64>>, labels: ClassLabels) -> Result<Self> {
        if probabilities.len() != labels.len() {
            return Err(VmlError::dims(
                "ClassifierEvaluation::new",
                format!("{} predictions", labels.len()),
                format!("{} predictions", probabilities.len()),
            ));
        }
        if labels.is_empty() {
            return Err(VmlError::invalid("cannot evaluate on an empty dataset"));
        }
        if let Some(p) = probabilities.iter().find(|p| p.len() != labels.num_classes()) {
            return Err(VmlError::dims(
                "ClassifierEvaluation::new",
                format!("{} class scores", labels.num_classes()),
                format!("{} class scores", p.len()),
            ));
        }
        let predicted = probabilities
            .iter()
            .map(|p| argmax(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            probabilities,
            predicted,
            labels,
        })
    }

    /// Predict every sample of `data`. The model must return class scores.
    pub fn from_model<M: Model + ?Sized>(
        model: &M,
        data: &Dataset,
        num_classes: usize,
    ) -> Result<Self> {
        let labels = data.class_labels(num_classes)?;
        let probabilities = data
            .x
            .rows()
            .map(|row| match model.predict(row)? {
                Prediction::Probabilities(p) => Ok(p),
                other => Err(VmlError::invalid(format!(
                    "{} does not predict class scores (got {:?})",
                    model.name(),
                    other
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(probabilities, labels)
    }

    pub fn predicted(&self) -> &[usize] {
        &self.predicted
    }

    fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.predicted
            .iter()
            .copied()
            .zip(self.labels.labels().iter().copied())
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.pairs().filter(|(p, t)| p == t).count(), self.labels.len())
    }

    /// Accuracy within each class; `None` for classes without samples.
    pub fn per_class_accuracy(&self) -> Vec<Option<f64>> {
        let k = self.labels.num_classes();
        let mut hits = vec![0usize; k];
        let mut totals = vec![0usize; k];
        for (p, t) in self.pairs() {
            totals[t] += 1;
            if p == t {
                hits[t] += 1;
            }
        }
        hits.iter()
            .zip(&totals)
            .map(|(&h, &n)| (n > 0).then(|| ratio(h, n)))
            .collect()
    }

    /// Mean of the per-class accuracies over the classes that have samples.
    pub fn avg_per_class_accuracy(&self) -> f64 {
        let present: Vec<f64> = self.per_class_accuracy().into_iter().flatten().collect();
        present.iter().sum::<f64>() / present.len() as f64
    }

    pub fn confusion_matrix(&self) -> Result<ConfusionMatrix> {
        if self.labels.num_classes() != 2 {
            return Err(VmlError::invalid(format!(
                "confusion matrix needs binary labels, got {} classes",
                self.labels.num_classes()
            )));
        }
        let mut m = ConfusionMatrix::default();
        for (p, t) in self.pairs() {
            match (p, t) {
                (1, 1) => m.true_positives += 1,
                (0, 0) => m.true_negatives += 1,
                (0, 1) => m.false_negatives += 1,
                _ => m.false_positives += 1,
            }
        }
        Ok(m)
    }

    pub fn precision(&self) -> Result<f64> {
        self.confusion_matrix()?.precision()
    }

    pub fn recall(&self) -> Result<f64> {
        self.confusion_matrix()?.recall()
    }

    pub fn fall_out(&self) -> Result<f64> {
        self.confusion_matrix()?.fall_out()
    }

    pub fn f1(&self) -> Result<f64> {
        self.confusion_matrix()?.f1()
    }

    /// Sum of `ln p(true class)` over all samples; `-inf` once any true class
    /// gets probability 0.
    pub fn log_loss(&self) -> f64 {
        self.probabilities
            .iter()
            .zip(self.labels.labels())
            .map(|(p, &t)| p[t].ln())
            .sum()
    }

    pub fn all_metrics(&self) -> ClassifierMetrics {
        ClassifierMetrics {
            accuracy: self.accuracy(),
            avg_per_class_accuracy: self.avg_per_class_accuracy(),
            per_class_accuracy: self.per_class_accuracy(),
            log_loss: self.log_loss(),
            confusion_matrix: self.confusion_matrix().ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn binary() -> ClassifierEvaluation {
        // predicted: 0, 1, 1, 0, 1 ; labels: 0, 1, 0, 1, 1
        let probs = vec![
            vec![0.9, 0.1],
            vec![0.2, 0.8],
            vec![0.4, 0.6],
            vec![0.7, 0.3],
            vec![0.25, 0.75],
        ];
        let labels = ClassLabels::new(vec![0, 1, 0, 1, 1], 2).unwrap();
        ClassifierEvaluation::new(probs, labels).unwrap()
    }

    #[test]
    fn test_regression_metrics() {
        let eval = RegressionEvaluation::new(vec![1.0, 2.5, 2.0], vec![1.0, 2.0, 4.0]).unwrap();
        assert_relative_eq!(eval.rmse(), ((0.25 + 4.0) / 3.0f64).sqrt());
        assert_relative_eq!(eval.mape().unwrap(), (0.0 + 0.25 + 0.5) / 3.0);
        assert_relative_eq!(eval.acp(0.3), 2.0 / 3.0);
        assert_relative_eq!(eval.acp(DEFAULT_ACP_THRESHOLD), 1.0 / 3.0);
    }

    #[test]
    fn test_mape_zero_label() {
        let eval = RegressionEvaluation::new(vec![1.0, 0.0], vec![1.0, 0.0]).unwrap();
        assert!(matches!(eval.mape(), Err(VmlError::DegenerateNumeric(_))));
        assert_eq!(eval.all_metrics().mape, None);
        assert_relative_eq!(eval.acp(0.1), 0.5);
    }

    #[test]
    fn test_confusion_matrix_and_rates() {
        let eval = binary();
        let m = eval.confusion_matrix().unwrap();
        assert_eq!(
            m,
            ConfusionMatrix {
                true_positives: 2,
                false_negatives: 1,
                false_positives: 1,
                true_negatives: 1,
            }
        );
        assert_relative_eq!(eval.precision().unwrap(), 2.0 / 3.0);
        assert_relative_eq!(eval.recall().unwrap(), 2.0 / 3.0);
        assert_relative_eq!(eval.fall_out().unwrap(), 0.5);
        assert_relative_eq!(eval.f1().unwrap(), 2.0 / 3.0);
    }

    #[test]
    fn test_rates_without_positive_samples_are_signaled() {
        let labels = ClassLabels::new(vec![0, 0, 0], 2).unwrap();
        let eval = ClassifierEvaluation::new(
            vec![vec![0.9, 0.1], vec![0.3, 0.7], vec![0.8, 0.2]],
            labels,
        )
        .unwrap();
        assert_relative_eq!(eval.fall_out().unwrap(), 1.0 / 3.0);
        assert_relative_eq!(eval.precision().unwrap(), 0.0);
        assert!(matches!(eval.recall(), Err(VmlError::DegenerateNumeric(_))));
        assert!(matches!(eval.f1(), Err(VmlError::DegenerateNumeric(_))));

        let m = ConfusionMatrix {
            true_negatives: 2,
            ..Default::default()
        };
        assert!(matches!(m.precision(), Err(VmlError::DegenerateNumeric(_))));
        assert_relative_eq!(m.fall_out().unwrap(), 0.0);
    }

    #[test]
    fn test_accuracies_and_log_loss() {
        let eval = binary();
        assert_relative_eq!(eval.accuracy(), 0.6);
        assert_eq!(eval.per_class_accuracy(), vec![Some(0.5), Some(2.0 / 3.0)]);
        assert_relative_eq!(eval.avg_per_class_accuracy(), (0.5 + 2.0 / 3.0) / 2.0);
        let expected = 0.9f64.ln() + 0.8f64.ln() + 0.4f64.ln() + 0.3f64.ln() + 0.75f64.ln();
        assert_relative_eq!(eval.log_loss(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_multiclass_has_no_confusion_matrix() {
        let labels = ClassLabels::new(vec![0, 2], 3).unwrap();
        let eval =
            ClassifierEvaluation::new(vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]], labels)
                .unwrap();
        assert!(matches!(eval.confusion_matrix(), Err(VmlError::InvalidArgument(_))));
        assert_eq!(eval.per_class_accuracy(), vec![Some(1.0), None, Some(0.0)]);
        assert_relative_eq!(eval.avg_per_class_accuracy(), 0.5);
        assert!(eval.all_metrics().confusion_matrix.is_none());
    }

    #[test]
    fn test_argmax_ties_keep_first() {
        let labels = ClassLabels::new(vec![0], 2).unwrap();
        let eval = ClassifierEvaluation::new(vec![vec![0.5, 0.5]], labels).unwrap();
        assert_eq!(eval.predicted(), &[0]);
    }

    #[test]
    fn test_shape_checks() {
        let labels = ClassLabels::new(vec![0, 1], 2).unwrap();
        assert!(ClassifierEvaluation::new(vec![vec![1.0, 0.0]], labels.clone()).is_err());
        assert!(ClassifierEvaluation::new(vec![vec![1.0], vec![0.0]], labels).is_err());
        assert!(RegressionEvaluation::new(vec![], vec![]).is_err());
    }
}
