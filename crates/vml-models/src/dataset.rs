//! Labeled datasets and the label spaces the models expect.
//!
//! Models fix their own label convention. Classification models take class
//! indices (`ClassLabels`), margin-based models take `Polarity` (+1 / -1),
//! and regressors take real targets. Translating between them is the
//! caller's job and goes through the explicit helpers in this module.
use serde::{Deserialize, Serialize};

use crate::error::{Result, VmlError};
use crate::math::Array2;

/// Sign label for margin-based models (perceptron, SVM, k-NN classification).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn as_f64(self) -> f64 {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
        }
    }

    /// Class 0 ("class A") maps to +1, class 1 ("class B") to -1.
    pub fn from_class_index(class: usize) -> Result<Self> {
        match class {
            0 => Ok(Polarity::Positive),
            1 => Ok(Polarity::Negative),
            other => Err(VmlError::invalid(format!(
                "only class 0 and 1 map to a polarity, got class {}",
                other
            ))),
        }
    }

    pub fn from_value(value: f64) -> Result<Self> {
        if value == 1.0 {
            Ok(Polarity::Positive)
        } else if value == -1.0 {
            Ok(Polarity::Negative)
        } else {
            Err(VmlError::invalid(format!(
                "polarity labels must be +1 or -1, got {}",
                value
            )))
        }
    }

    /// Inverse of [`Polarity::from_class_index`].
    pub fn class_index(self) -> usize {
        match self {
            Polarity::Positive => 0,
            Polarity::Negative => 1,
        }
    }
}

/// Upper bound on the number of classes a label space may declare.
pub const MAX_NUM_CLASSES: usize = 1024;

/// Validated class indices in `0..num_classes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabels {
    labels: Vec<usize>,
    num_classes: usize,
}

impl ClassLabels {
    pub fn new(labels: Vec<usize>, num_classes: usize) -> Result<Self> {
        if num_classes == 0 || num_classes > MAX_NUM_CLASSES {
            return Err(VmlError::invalid(format!(
                "num_classes must be in 1..={}, got {}",
                MAX_NUM_CLASSES, num_classes
            )));
        }
        if let Some(bad) = labels.iter().find(|&&l| l >= num_classes) {
            return Err(VmlError::invalid(format!(
                "label {} out of range for {} classes",
                bad, num_classes
            )));
        }
        Ok(Self {
            labels,
            num_classes,
        })
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn to_polarities(&self) -> Result<Vec<Polarity>> {
        self.labels
            .iter()
            .map(|&l| Polarity::from_class_index(l))
            .collect()
    }
}

/// Samples (one row each) with one real-valued label per row.
///
/// Class indices and +/-1 labels are stored as their numeric value; the
/// `*_labels` accessors convert and validate on the way out.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub x: Array2<f64>,
    pub y: Vec<f64>,
}

impl Dataset {
    pub fn new(x: Array2<f64>, y: Vec<f64>) -> Result<Self> {
        check_labels_match("Dataset::new", &x, y.len())?;
        Ok(Self { x, y })
    }

    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R], y: Vec<f64>) -> Result<Self> {
        Self::new(Array2::from_rows(rows)?, y)
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.x.ncols()
    }

    pub fn class_labels(&self, num_classes: usize) -> Result<ClassLabels> {
        let labels = self
            .y
            .iter()
            .map(|&v| class_index(v))
            .collect::<Result<Vec<_>>>()?;
        ClassLabels::new(labels, num_classes)
    }

    pub fn polarity_labels(&self) -> Result<Vec<Polarity>> {
        self.y.iter().map(|&v| Polarity::from_value(v)).collect()
    }

    /// Number of classes implied by the largest class index. Every label must
    /// be a valid class index.
    pub fn infer_num_classes(&self) -> Result<usize> {
        self.y.iter().try_fold(0usize, |acc, &v| {
            let next = class_index(v)?.checked_add(1).ok_or_else(|| {
                VmlError::invalid(format!("class label {} is too large", v))
            })?;
            Ok(acc.max(next))
        })
    }

    /// Per-class sample matrices, indexed by class.
    pub fn split_by_class(&self, num_classes: usize) -> Result<Vec<Array2<f64>>> {
        let labels = self.class_labels(num_classes)?;
        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); num_classes];
        for (i, &l) in labels.labels().iter().enumerate() {
            groups[l].push(i);
        }
        Ok(groups.iter().map(|idx| self.x.select_rows(idx)).collect())
    }

    pub fn summary(&self) -> String {
        format!("{} samples x {} features", self.len(), self.dim())
    }
}

fn class_index(v: f64) -> Result<usize> {
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < MAX_NUM_CLASSES as f64 {
        Ok(v as usize)
    } else {
        Err(VmlError::invalid(format!(
            "class labels must be integers in 0..{}, got {}",
            MAX_NUM_CLASSES, v
        )))
    }
}

pub(crate) fn check_labels_match(op: &'static str, x: &Array2<f64>, n_labels: usize) -> Result<()> {
    if x.nrows() != n_labels {
        return Err(VmlError::dims(
            op,
            format!("{} labels", x.nrows()),
            format!("{} labels", n_labels),
        ));
    }
    Ok(())
}

pub(crate) fn check_non_empty(op: &'static str, x: &Array2<f64>) -> Result<()> {
    if x.nrows() == 0 {
        return Err(VmlError::invalid(format!("{}: dataset is empty", op)));
    }
    Ok(())
}

pub(crate) fn check_finite(op: &'static str, x: &Array2<f64>) -> Result<()> {
    if let Some(v) = x.as_slice().iter().find(|v| !v.is_finite()) {
        return Err(VmlError::invalid(format!(
            "{}: samples must be finite, got {}",
            op, v
        )));
    }
    Ok(())
}

pub(crate) fn check_point_dim(op: &'static str, expected: usize, x: &[f64]) -> Result<()> {
    if x.len() != expected {
        return Err(VmlError::dims(
            op,
            format!("point of dimension {}", expected),
            format!("dimension {}", x.len()),
        ));
    }
    Ok(())
}
