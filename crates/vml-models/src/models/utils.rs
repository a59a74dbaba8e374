//! Helpers shared by several model implementations.
use rand::{Rng, RngCore};

use crate::error::{Result, VmlError};
use crate::math::linalg::{norm, scale};
use crate::math::Array2;

/// Rescale `grad` so its L2 norm does not exceed `threshold`.
pub fn gradient_clipping(grad: Vec<f64>, threshold: f64) -> Vec<f64> {
    let n = norm(&grad);
    if n > threshold {
        scale(&grad, threshold / n)
    } else {
        grad
    }
}

/// Index of the largest value; ties keep the first occurrence.
pub fn argmax(values: &[f64]) -> Result<usize> {
    if values.is_empty() {
        return Err(VmlError::invalid("argmax of an empty list"));
    }
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    Ok(best)
}

/// Two-class score vector from a signed margin: positive -> class 0,
/// negative -> class 1, exactly zero -> undecided.
pub fn two_class_from_margin(margin: f64) -> Vec<f64> {
    if margin > 0.0 {
        vec![1.0, 0.0]
    } else if margin < 0.0 {
        vec![0.0, 1.0]
    } else {
        vec![0.5, 0.5]
    }
}

pub fn uniform_vec(rng: &mut dyn RngCore, len: usize, low: f64, high: f64) -> Vec<f64> {
    (0..len).map(|_| rng.gen_range(low..high)).collect()
}

pub fn random_index(rng: &mut dyn RngCore, len: usize) -> usize {
    rng.gen_range(0..len)
}

/// Copy `x` with a trailing constant 1 feature (the folded-in bias).
pub fn with_bias(x: &[f64]) -> Vec<f64> {
    let mut v = Vec::with_capacity(x.len() + 1);
    v.extend_from_slice(x);
    v.push(1.0);
    v
}

/// Per-column `(min, max)` of a non-empty matrix.
pub fn bounding_box(x: &Array2<f64>) -> Vec<(f64, f64)> {
    (0..x.ncols())
        .map(|c| {
            x.rows().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), row| {
                (lo.min(row[c]), hi.max(row[c]))
            })
        })
        .collect()
}

/// Index of the row of `candidates` nearest to `x`; the first strictly closer
/// row wins ties.
pub fn nearest_row(candidates: &[Vec<f64>], x: &[f64]) -> Result<usize> {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in candidates.iter().enumerate() {
        let d = crate::math::linalg::euclidean_distance(c, x)?;
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    Ok(best)
}
