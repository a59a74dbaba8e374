//! Feature transforms and evaluation grids.
//!
//! Polynomial feature maps and bias augmentation feed the regression models;
//! min-max scaling and the grid builders exist for callers that place data on,
//! and evaluate models over, the usual [-5, 5] drawing area.

use crate::error::{Result, VmlError};
use crate::math::Array2;
use crate::models::utils::{bounding_box, with_bias};

/// Grid spacing used when the caller does not pick one.
pub const DEFAULT_GRID_STEP: f64 = 0.02;

/// Target range of [`scale_to_range`] when none is given.
pub const DEFAULT_RANGE: (f64, f64) = (-5.0, 5.0);

/// `phi(x) = (1, x, x^2, ..., x^degree)`.
pub fn polynomial_phi(x: f64, degree: usize) -> Vec<f64> {
    (0..=degree).map(|j| x.powi(j as i32)).collect()
}

/// Apply [`polynomial_phi`] to every coordinate of every row and concatenate
/// the results, so each row grows to `ncols * (degree + 1)` features.
pub fn polynomial_features(x: &Array2<f64>, degree: usize) -> Result<Array2<f64>> {
    let rows: Vec<Vec<f64>> = x
        .rows()
        .map(|row| {
            row.iter()
                .flat_map(|&v| polynomial_phi(v, degree))
                .collect()
        })
        .collect();
    if rows.is_empty() {
        return Ok(Array2::zeros(0, x.ncols() * (degree + 1)));
    }
    Array2::from_rows(&rows)
}

/// Append a constant 1 column.
pub fn add_bias_column(x: &Array2<f64>) -> Result<Array2<f64>> {
    let rows: Vec<Vec<f64>> = x.rows().map(with_bias).collect();
    if rows.is_empty() {
        return Ok(Array2::zeros(0, x.ncols() + 1));
    }
    Array2::from_rows(&rows)
}

/// Linearly map each column of `x` from its observed `[min, max]` onto
/// `range`. A constant column lands on the middle of the range.
pub fn scale_to_range(x: &Array2<f64>, range: (f64, f64)) -> Result<Array2<f64>> {
    let (lo, hi) = range;
    if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
        return Err(VmlError::invalid(format!(
            "invalid target range [{}, {}]",
            lo, hi
        )));
    }
    if x.nrows() == 0 {
        return Ok(x.clone());
    }

    let bounds = bounding_box(x);
    let mut out = x.clone();
    for r in 0..out.nrows() {
        for (c, &(min, max)) in bounds.iter().enumerate() {
            let v = &mut out[(r, c)];
            *v = if max > min {
                lo + (*v - min) / (max - min) * (hi - lo)
            } else {
                0.5 * (lo + hi)
            };
        }
    }
    Ok(out)
}

/// Evenly spaced values `start, start + step, ...` strictly below `end`.
fn axis(start: f64, end: f64, step: f64) -> Result<Vec<f64>> {
    if !(step.is_finite() && step > 0.0) {
        return Err(VmlError::invalid(format!(
            "grid step must be positive, got {}",
            step
        )));
    }
    if !(start.is_finite() && end.is_finite()) {
        return Err(VmlError::invalid("grid bounds must be finite"));
    }
    // Small slack so `end` itself is not produced by rounding noise.
    let count = ((end - start) / step - 1e-9).ceil().max(0.0) as usize;
    Ok((0..count).map(|i| start + i as f64 * step).collect())
}

/// 2-D grid over `[x1, x2) x [y1, y2)`, x-major, without a bias column.
pub fn build_grid_without_bias(
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    step: f64,
) -> Result<Vec<[f64; 2]>> {
    let xs = axis(x1, x2, step)?;
    let ys = axis(y1, y2, step)?;
    let mut grid = Vec::with_capacity(xs.len() * ys.len());
    for &x in &xs {
        for &y in &ys {
            grid.push([x, y]);
        }
    }
    Ok(grid)
}

/// Same as [`build_grid_without_bias`] with a trailing constant 1 per point.
pub fn build_grid(x1: f64, x2: f64, y1: f64, y2: f64, step: f64) -> Result<Vec<[f64; 3]>> {
    Ok(build_grid_without_bias(x1, x2, y1, y2, step)?
        .into_iter()
        .map(|[x, y]| [x, y, 1.0])
        .collect())
}

pub fn build_grid_1d(x1: f64, x2: f64, step: f64) -> Result<Vec<f64>> {
    axis(x1, x2, step)
}
