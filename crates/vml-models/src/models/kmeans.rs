//! Lloyd's k-means clustering.
use rand::{Rng, RngCore};

use crate::dataset::{check_finite, check_non_empty, check_point_dim};
use crate::error::{Result, VmlError};
use crate::math::linalg::squared_distance;
use crate::math::Array2;
use crate::models::model_trait::{Model, Prediction};
use crate::models::utils::{bounding_box, nearest_row};

#[derive(Debug, Clone, Default)]
pub struct KMeans {
    data: Array2<f64>,
    centers: Vec<Vec<f64>>,
    assignments: Vec<usize>,
    ready: bool,
}

/// Uniform draw from `[lo, hi)`; spans too wide for `gen_range` are sampled
/// as a convex combination of the bounds.
fn sample_between(rng: &mut dyn RngCore, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        lo
    } else if (hi - lo).is_finite() {
        rng.gen_range(lo..hi)
    } else {
        let u: f64 = rng.gen();
        lo * (1.0 - u) + hi * u
    }
}

impl KMeans {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `num_clusters` centroids uniformly at random inside the data's
    /// bounding box.
    pub fn init(
        &mut self,
        x: &Array2<f64>,
        num_clusters: usize,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        check_non_empty("KMeans::init", x)?;
        check_finite("KMeans::init", x)?;
        if num_clusters == 0 {
            return Err(VmlError::invalid("number of clusters must be at least 1"));
        }

        let bounds = bounding_box(x);
        self.centers = (0..num_clusters)
            .map(|_| {
                bounds
                    .iter()
                    .map(|&(lo, hi)| sample_between(rng, lo, hi))
                    .collect()
            })
            .collect();
        self.data = x.clone();
        self.assignments = vec![0; x.nrows()];
        self.ready = true;

        log::debug!(
            "k-means initialized with {} centroids over {} samples",
            num_clusters,
            x.nrows()
        );
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(VmlError::NotReady("k-means"))
        }
    }

    pub fn centers(&self) -> &[Vec<f64>] {
        &self.centers
    }

    /// Cluster index of every sample as of the last [`KMeans::fit_step`].
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// One assignment sweep followed by one centroid update. A centroid that
    /// received no samples stays where it was.
    pub fn fit_step(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let dim = self.data.ncols();
        let k = self.centers.len();
        let mut sums = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];

        for (i, row) in self.data.rows().enumerate() {
            let c = nearest_row(&self.centers, row)?;
            self.assignments[i] = c;
            counts[c] += 1;
            for (s, v) in sums[c].iter_mut().zip(row) {
                *s += v;
            }
        }

        for (c, (sum, count)) in sums.into_iter().zip(counts).enumerate() {
            if count == 0 {
                log::warn!("k-means cluster {} is empty, keeping its centroid", c);
                continue;
            }
            self.centers[c] = sum.into_iter().map(|s| s / count as f64).collect();
        }
        Ok(())
    }

    /// Index of the nearest centroid; the first of equally near ones wins.
    pub fn predict_cluster(&self, x: &[f64]) -> Result<usize> {
        self.ensure_ready()?;
        check_point_dim("KMeans::predict", self.data.ncols(), x)?;
        nearest_row(&self.centers, x)
    }

    /// Sum of squared distances from every sample to its nearest centroid.
    pub fn inertia(&self) -> Result<f64> {
        self.ensure_ready()?;
        let mut total = 0.0;
        for row in self.data.rows() {
            let c = nearest_row(&self.centers, row)?;
            total += squared_distance(&self.centers[c], row)?;
        }
        Ok(total)
    }
}

impl Model for KMeans {
    fn name(&self) -> &'static str {
        "kmeans"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        self.predict_cluster(x).map(Prediction::Cluster)
    }
}
