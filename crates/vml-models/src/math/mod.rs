//! Small dense linear-algebra types used throughout the crate.
//!
//! `Array2` is a row-major matrix; vectors are plain `Vec<f64>` / `&[f64]`.
//! The `linalg` module holds the free functions (dot products, products,
//! inverse, determinant, distances) every model builds on. Everything here is
//! sized for the 1-3 dimensional problems the models are used for, so the
//! algorithms are the straightforward textbook ones.
pub mod linalg;
pub mod matrix;

pub use matrix::Array2;
