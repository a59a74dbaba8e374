//! Kernel functions for the SVM.
//!
//! Any `Fn(&[f64], &[f64]) -> f64` closure is a [`Kernel`]; [`KernelConfig`]
//! covers the standard families and can be (de)serialized.
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VmlError};
use crate::math::linalg::{dot, squared_distance};

pub trait Kernel: Send {
    fn compute(&self, a: &[f64], b: &[f64]) -> Result<f64>;
}

impl<F> Kernel for F
where
    F: Fn(&[f64], &[f64]) -> f64 + Send,
{
    fn compute(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(VmlError::dims(
                "Kernel::compute",
                format!("length {}", a.len()),
                format!("length {}", b.len()),
            ));
        }
        Ok(self(a, b))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KernelConfig {
    /// `a . b + bias`
    Linear { bias: f64 },
    /// `(a . b + bias)^degree`
    Polynomial { degree: i32, bias: f64 },
    /// `exp(-|a - b|^2 / sigma^2)`
    Gaussian { sigma: f64 },
    /// `tanh(scale * a . b + offset)`
    Sigmoid { scale: f64, offset: f64 },
    /// Arc-sine kernel of an infinitely wide extreme learning machine.
    Elm { sigma: f64 },
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig::Linear { bias: 1.0 }
    }
}

impl KernelConfig {
    pub fn validate(&self) -> Result<()> {
        let ok = match *self {
            KernelConfig::Linear { bias } | KernelConfig::Polynomial { bias, .. } => {
                bias.is_finite()
            }
            KernelConfig::Gaussian { sigma } | KernelConfig::Elm { sigma } => {
                sigma.is_finite() && sigma != 0.0
            }
            KernelConfig::Sigmoid { scale, offset } => scale.is_finite() && offset.is_finite(),
        };
        if ok {
            Ok(())
        } else {
            Err(VmlError::invalid(format!("invalid kernel parameters: {:?}", self)))
        }
    }
}

impl Kernel for KernelConfig {
    fn compute(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        Ok(match *self {
            KernelConfig::Linear { bias } => dot(a, b)? + bias,
            KernelConfig::Polynomial { degree, bias } => (dot(a, b)? + bias).powi(degree),
            KernelConfig::Gaussian { sigma } => (-squared_distance(a, b)? / (sigma * sigma)).exp(),
            KernelConfig::Sigmoid { scale, offset } => (scale * dot(a, b)? + offset).tanh(),
            KernelConfig::Elm { sigma } => {
                let s = 1.0 / (2.0 * sigma * sigma);
                let num = 1.0 + dot(a, b)?;
                let den = ((s + 1.0 + dot(a, a)?) * (s + 1.0 + dot(b, b)?)).sqrt();
                2.0 / PI * (num / den).asin()
            }
        })
    }
}
