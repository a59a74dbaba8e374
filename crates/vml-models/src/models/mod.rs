pub mod model_trait;
pub mod utils;

pub mod bayesian_linear_regression;
pub mod decision_tree;
pub mod gaussian_mixture;
pub mod kernels;
pub mod kmeans;
pub mod knn;
pub mod lvq;
pub mod naive_bayes;
pub mod perceptron;
pub mod polynomial_regression;
pub mod softmax_regression;
pub mod svm;

pub mod factory;

pub use model_trait::{BatchModel, IterativeModel, Model, Prediction};
