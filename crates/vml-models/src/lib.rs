//! vml-models: classic machine-learning models written from scratch.
//!
//! The crate collects small, dependency-light implementations of the models
//! used to teach supervised and unsupervised learning on low-dimensional
//! data: perceptron, polynomial and Bayesian linear regression, softmax
//! regression, k-NN, k-means, Gaussian mixtures, LVQ1, naive Bayes, decision
//! trees and a kernel SVM. Every model exposes its own explicit API plus the
//! uniform [`models::Model`] contract; [`models::factory::build_model`] turns
//! a [`config::ModelConfig`] into a ready-to-train instance.
//!
//! Supporting modules provide the dense linear algebra the models build on,
//! feature transforms and evaluation grids, goodness-of-fit metrics and
//! dataset import/export.
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod math;
pub mod models;
pub mod preprocessing;
pub mod stats;

pub use dataset::{ClassLabels, Dataset, Polarity};
pub use error::{Result, VmlError};
