//! Free linear-algebra functions over `&[f64]` vectors and `Array2<f64>` matrices.
//!
//! None of these functions mutate their inputs. Shape mismatches are reported
//! as [`VmlError::DimensionMismatch`]; a singular matrix makes [`inverse`] fail
//! with [`VmlError::DegenerateNumeric`] while [`determinant`] returns `0.0`.

use crate::error::{Result, VmlError};
use crate::math::Array2;

/// Pivots whose magnitude falls below this fraction of the matrix's largest
/// entry are treated as exact zeros.
const SINGULAR_TOLERANCE: f64 = 1e-12;

fn check_len(op: &'static str, a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(VmlError::dims(
            op,
            format!("length {}", a.len()),
            format!("length {}", b.len()),
        ));
    }
    Ok(())
}

fn check_square(op: &'static str, m: &Array2<f64>) -> Result<()> {
    if !m.is_square() {
        return Err(VmlError::dims(
            op,
            "square matrix",
            format!("{}x{}", m.nrows(), m.ncols()),
        ));
    }
    Ok(())
}

fn dot_scalar_f64(lhs: &[f64], rhs: &[f64]) -> f64 {
    lhs.iter().zip(rhs.iter()).map(|(a, b)| a * b).sum()
}

pub fn dot(a: &[f64], b: &[f64]) -> Result<f64> {
    check_len("dot", a, b)?;
    Ok(dot_scalar_f64(a, b))
}

pub fn mat_vec_mul(m: &Array2<f64>, v: &[f64]) -> Result<Vec<f64>> {
    if m.ncols() != v.len() {
        return Err(VmlError::dims(
            "mat_vec_mul",
            format!("vector of length {}", m.ncols()),
            format!("length {}", v.len()),
        ));
    }
    Ok(m.rows().map(|row| dot_scalar_f64(row, v)).collect())
}

pub fn mat_mat_mul(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    if a.ncols() != b.nrows() {
        return Err(VmlError::dims(
            "mat_mat_mul",
            format!("{} rows on the right operand", a.ncols()),
            format!("{} rows", b.nrows()),
        ));
    }
    let mut out = Array2::zeros(a.nrows(), b.ncols());
    for i in 0..a.nrows() {
        for k in 0..a.ncols() {
            let aik = a[(i, k)];
            if aik == 0.0 {
                continue;
            }
            for j in 0..b.ncols() {
                out[(i, j)] += aik * b[(k, j)];
            }
        }
    }
    Ok(out)
}

pub fn transpose(m: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(m.ncols(), m.nrows());
    for i in 0..m.nrows() {
        for j in 0..m.ncols() {
            out[(j, i)] = m[(i, j)];
        }
    }
    out
}

pub fn mat_add(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    if a.shape() != b.shape() {
        return Err(VmlError::dims(
            "mat_add",
            format!("{:?}", a.shape()),
            format!("{:?}", b.shape()),
        ));
    }
    let data = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| x + y)
        .collect();
    Array2::from_shape_vec(a.shape(), data)
}

pub fn scalar_multiply(m: &Array2<f64>, s: f64) -> Array2<f64> {
    m.mapv(|v| v * s)
}

pub fn scale(v: &[f64], s: f64) -> Vec<f64> {
    v.iter().map(|x| x * s).collect()
}

pub fn add(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    check_len("add", a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x + y).collect())
}

pub fn sub(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    check_len("sub", a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x - y).collect())
}

pub fn norm(v: &[f64]) -> f64 {
    dot_scalar_f64(v, v).sqrt()
}

pub fn squared_distance(a: &[f64], b: &[f64]) -> Result<f64> {
    check_len("squared_distance", a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum())
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Result<f64> {
    Ok(squared_distance(a, b)?.sqrt())
}

/// `a * b^T`, an `a.len() x b.len()` matrix.
pub fn outer_product(a: &[f64], b: &[f64]) -> Array2<f64> {
    let mut out = Array2::zeros(a.len(), b.len());
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[(i, j)] = x * y;
        }
    }
    out
}

/// `x^T m x` for a square `m`.
pub fn quadratic_form(x: &[f64], m: &Array2<f64>) -> Result<f64> {
    let mx = mat_vec_mul(m, x)?;
    dot(x, &mx)
}

fn max_abs(m: &Array2<f64>) -> f64 {
    m.as_slice().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

/// Determinant via LU decomposition with partial pivoting.
///
/// Singular (or numerically singular) matrices yield exactly `0.0`.
pub fn determinant(m: &Array2<f64>) -> Result<f64> {
    check_square("determinant", m)?;
    let n = m.nrows();
    if n == 0 {
        return Ok(1.0);
    }
    let tol = SINGULAR_TOLERANCE * max_abs(m);
    let mut lu = m.clone();
    let mut det = 1.0;

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| lu[(a, col)].abs().total_cmp(&lu[(b, col)].abs()))
            .unwrap_or(col);
        let pivot = lu[(pivot_row, col)];
        if pivot.abs() <= tol {
            return Ok(0.0);
        }
        if pivot_row != col {
            swap_rows(&mut lu, pivot_row, col);
            det = -det;
        }
        det *= pivot;
        for row in (col + 1)..n {
            let factor = lu[(row, col)] / pivot;
            for k in col..n {
                let v = lu[(col, k)];
                lu[(row, k)] -= factor * v;
            }
        }
    }
    Ok(det)
}

/// Inverse via Gauss-Jordan elimination with partial pivoting.
pub fn inverse(m: &Array2<f64>) -> Result<Array2<f64>> {
    check_square("inverse", m)?;
    let n = m.nrows();
    let tol = SINGULAR_TOLERANCE * max_abs(m);
    let mut a = m.clone();
    let mut inv = Array2::identity(n);

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&x, &y| a[(x, col)].abs().total_cmp(&a[(y, col)].abs()))
            .unwrap_or(col);
        let pivot = a[(pivot_row, col)];
        if pivot.abs() <= tol {
            return Err(VmlError::DegenerateNumeric(format!(
                "cannot invert singular {}x{} matrix",
                n, n
            )));
        }
        if pivot_row != col {
            swap_rows(&mut a, pivot_row, col);
            swap_rows(&mut inv, pivot_row, col);
        }
        for k in 0..n {
            a[(col, k)] /= pivot;
            inv[(col, k)] /= pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[(row, col)];
            if factor == 0.0 {
                continue;
            }
            for k in 0..n {
                let av = a[(col, k)];
                let iv = inv[(col, k)];
                a[(row, k)] -= factor * av;
                inv[(row, k)] -= factor * iv;
            }
        }
    }
    Ok(inv)
}

fn swap_rows(m: &mut Array2<f64>, r1: usize, r2: usize) {
    for c in 0..m.ncols() {
        let tmp = m[(r1, c)];
        m[(r1, c)] = m[(r2, c)];
        m[(r2, c)] = tmp;
    }
}

/// Solve `(phi^T phi + lambda I) w = phi^T y`, the ridge-regression normal equations.
pub fn ridge_solve(phi: &Array2<f64>, y: &[f64], lambda: f64) -> Result<Vec<f64>> {
    if phi.nrows() != y.len() {
        return Err(VmlError::dims(
            "ridge_solve",
            format!("{} targets", phi.nrows()),
            format!("{} targets", y.len()),
        ));
    }
    let phi_t = transpose(phi);
    let gram = mat_mat_mul(&phi_t, phi)?;
    let reg = scalar_multiply(&Array2::identity(phi.ncols()), lambda);
    let lhs_inv = inverse(&mat_add(&gram, &reg)?)?;
    let rhs = mat_vec_mul(&phi_t, y)?;
    mat_vec_mul(&lhs_inv, &rhs)
}
