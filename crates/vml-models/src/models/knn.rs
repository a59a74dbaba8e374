//! k-nearest-neighbours for regression and +/-1 classification.
//!
//! There is no training phase; every query scans the stored samples.
use serde::{Deserialize, Serialize};

use crate::dataset::{check_labels_match, check_non_empty, check_point_dim, Polarity};
use crate::error::{Result, VmlError};
use crate::math::linalg::euclidean_distance;
use crate::math::Array2;
use crate::models::model_trait::{Model, Prediction};
use crate::models::utils::two_class_from_margin;

/// What [`Model::predict`] answers for a k-NN model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnnTask {
    #[default]
    Classification,
    Regression,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
    pub label: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Knn {
    k: usize,
    data: Array2<f64>,
    labels: Vec<f64>,
    task: KnnTask,
    ready: bool,
}

impl Knn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the samples. For classification the labels must be +1 / -1.
    pub fn init(&mut self, x: &Array2<f64>, labels: &[f64], k: usize, task: KnnTask) -> Result<()> {
        check_non_empty("Knn::init", x)?;
        check_labels_match("Knn::init", x, labels.len())?;
        if k == 0 {
            return Err(VmlError::invalid("k must be at least 1"));
        }
        if task == KnnTask::Classification {
            for &l in labels {
                Polarity::from_value(l)?;
            }
        }
        self.k = k;
        self.data = x.clone();
        self.labels = labels.to_vec();
        self.task = task;
        self.ready = true;
        Ok(())
    }

    /// Convenience wrapper taking +/-1 labels as [`Polarity`].
    pub fn init_classification(
        &mut self,
        x: &Array2<f64>,
        labels: &[Polarity],
        k: usize,
    ) -> Result<()> {
        let values: Vec<f64> = labels.iter().map(|p| p.as_f64()).collect();
        self.init(x, &values, k, KnnTask::Classification)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(VmlError::NotReady("k-nearest neighbours"))
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn task(&self) -> KnnTask {
        self.task
    }

    /// The (at most) `k` nearest samples, closest first. Among equally distant
    /// samples the one stored first is kept.
    pub fn find_knn(&self, x: &[f64]) -> Result<Vec<Neighbor>> {
        self.ensure_ready()?;
        check_point_dim("Knn::find_knn", self.data.ncols(), x)?;

        let mut knn: Vec<Neighbor> = Vec::with_capacity(self.k + 1);
        for (index, (row, &label)) in self.data.rows().zip(&self.labels).enumerate() {
            let distance = euclidean_distance(x, row)?;
            let pos = knn
                .iter()
                .position(|n| n.distance > distance)
                .unwrap_or(knn.len());
            if pos < self.k {
                knn.insert(pos, Neighbor { index, distance, label });
                knn.truncate(self.k);
            }
        }
        Ok(knn)
    }

    /// Mean label of the nearest neighbours.
    pub fn predict_regression(&self, x: &[f64]) -> Result<f64> {
        let knn = self.find_knn(x)?;
        Ok(knn.iter().map(|n| n.label).sum::<f64>() / knn.len() as f64)
    }

    /// `[positive, negative]` from the sign of the summed +/-1 labels; an
    /// exact tie gives `[0.5, 0.5]`.
    pub fn predict_classification(&self, x: &[f64]) -> Result<Vec<f64>> {
        let knn = self.find_knn(x)?;
        let mut sum = 0.0;
        for n in &knn {
            sum += Polarity::from_value(n.label)?.as_f64();
        }
        Ok(two_class_from_margin(sum))
    }
}

impl Model for Knn {
    fn name(&self) -> &'static str {
        "knn"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        match self.task {
            KnnTask::Classification => self
                .predict_classification(x)
                .map(Prediction::Probabilities),
            KnnTask::Regression => self.predict_regression(x).map(Prediction::Value),
        }
    }
}
