//! Integration tests for the matrix type, linear-algebra helpers and feature transforms.

use approx::assert_abs_diff_eq;
use vml_models::math::linalg::{
    determinant, inverse, mat_mat_mul, mat_vec_mul, quadratic_form, ridge_solve, transpose,
};
use vml_models::math::Array2;
use vml_models::preprocessing::{
    add_bias_column, build_grid, build_grid_1d, polynomial_features, scale_to_range,
    DEFAULT_RANGE,
};
use vml_models::VmlError;

// ---------------------------------------------------------------------------
// Array2 basics
// ---------------------------------------------------------------------------

#[test]
fn array2_from_rows_and_shape() {
    let a = Array2::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
    assert_eq!(a.shape(), (2, 3));
    assert_eq!(a.row(1), &[4.0, 5.0, 6.0]);
    assert_eq!(a.column(2), vec![3.0, 6.0]);
    assert_eq!(a[(0, 1)], 2.0);
}

#[test]
fn array2_ragged_rows_error() {
    let rows: Vec<Vec<f64>> = vec![vec![1.0, 2.0], vec![3.0]];
    assert!(Array2::from_rows(&rows).is_err());
    assert!(Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0]).is_err());
}

#[test]
fn array2_select_rows() {
    let a = Array2::from_rows(&[[1, 1], [2, 2], [3, 3]]).unwrap();
    let picked = a.select_rows(&[2, 0]);
    assert_eq!(picked.to_rows(), vec![vec![3, 3], vec![1, 1]]);
}

#[test]
fn array2_identity_and_diag() {
    let i: Array2<f64> = Array2::identity(3);
    assert_eq!(i, Array2::from_diag(&[1.0, 1.0, 1.0]));
    assert!(i.is_square());
}

// ---------------------------------------------------------------------------
// Linear algebra
// ---------------------------------------------------------------------------

#[test]
fn products_and_transpose() {
    let a = Array2::from_rows(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]).unwrap();
    let at = transpose(&a);
    assert_eq!(at.shape(), (2, 3));
    let gram = mat_mat_mul(&at, &a).unwrap();
    assert_eq!(gram.to_rows(), vec![vec![35.0, 44.0], vec![44.0, 56.0]]);
    assert_eq!(mat_vec_mul(&a, &[1.0, -1.0]).unwrap(), vec![-1.0, -1.0, -1.0]);
    assert!(matches!(
        mat_mat_mul(&a, &a),
        Err(VmlError::DimensionMismatch { .. })
    ));
}

#[test]
fn inverse_times_matrix_is_identity() {
    let m = Array2::from_rows(&[[4.0, 7.0, 2.0], [3.0, 6.0, 1.0], [2.0, 5.0, 3.0]]).unwrap();
    let inv = inverse(&m).unwrap();
    let product = mat_mat_mul(&m, &inv).unwrap();
    for r in 0..3 {
        for c in 0..3 {
            let expected = if r == c { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(product[(r, c)], expected, epsilon = 1e-10);
        }
    }
    assert_abs_diff_eq!(determinant(&m).unwrap(), 9.0, epsilon = 1e-10);
}

#[test]
fn singular_matrix() {
    let m = Array2::from_rows(&[[1.0, 2.0], [2.0, 4.0]]).unwrap();
    assert_eq!(determinant(&m).unwrap(), 0.0);
    assert!(matches!(inverse(&m), Err(VmlError::DegenerateNumeric(_))));
}

#[test]
fn quadratic_form_of_diagonal() {
    let m = Array2::from_diag(&[2.0, 3.0]);
    assert_abs_diff_eq!(quadratic_form(&[1.0, 2.0], &m).unwrap(), 14.0);
}

#[test]
fn ridge_solve_recovers_line() {
    // t = 1 + 2x with a bias column.
    let phi = Array2::from_rows(&[[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]]).unwrap();
    let w = ridge_solve(&phi, &[1.0, 3.0, 5.0, 7.0], 0.0).unwrap();
    assert_abs_diff_eq!(w[0], 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(w[1], 2.0, epsilon = 1e-9);
    assert!(ridge_solve(&phi, &[1.0, 2.0], 0.0).is_err());
}

// ---------------------------------------------------------------------------
// Feature transforms
// ---------------------------------------------------------------------------

#[test]
fn polynomial_features_expand_each_column() {
    let x = Array2::from_rows(&[[2.0, -1.0]]).unwrap();
    let phi = polynomial_features(&x, 2).unwrap();
    assert_eq!(phi.row(0), &[1.0, 2.0, 4.0, 1.0, -1.0, 1.0]);
}

#[test]
fn bias_column_is_appended() {
    let x = Array2::from_rows(&[[0.5, 0.25], [1.0, 2.0]]).unwrap();
    let b = add_bias_column(&x).unwrap();
    assert_eq!(b.shape(), (2, 3));
    assert_eq!(b.column(2), vec![1.0, 1.0]);
}

#[test]
fn scaling_hits_range_bounds() {
    let x = Array2::from_rows(&[[0.0, 7.0], [10.0, 7.0], [5.0, 7.0]]).unwrap();
    let scaled = scale_to_range(&x, DEFAULT_RANGE).unwrap();
    assert_eq!(scaled.column(0), vec![-5.0, 5.0, 0.0]);
    assert_eq!(scaled.column(1), vec![0.0, 0.0, 0.0]);
    assert!(scale_to_range(&x, (1.0, 1.0)).is_err());
}

#[test]
fn grids_cover_half_open_ranges() {
    let axis = build_grid_1d(0.0, 1.0, 0.25).unwrap();
    assert_eq!(axis.len(), 4);
    assert_abs_diff_eq!(axis[3], 0.75);

    let grid = build_grid(-1.0, 1.0, 0.0, 1.0, 0.5).unwrap();
    assert_eq!(grid.len(), 4 * 2);
    assert_eq!(grid[0], [-1.0, 0.0, 1.0]);
    assert!(build_grid_1d(0.0, 1.0, 0.0).is_err());
}
