use thiserror::Error;

/// Result alias used by every model and linear-algebra routine in the crate.
pub type Result<T> = std::result::Result<T, VmlError>;

/// Errors raised by the model library.
///
/// All variants are local and recoverable by the caller; none of them
/// indicate a corrupted model beyond the call that produced them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VmlError {
    /// A hyperparameter or input has the wrong shape or value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Predict or a training step was called before initialization.
    #[error("{0} has not been initialized")]
    NotReady(&'static str),

    /// Operand shapes do not conform.
    #[error("dimension mismatch in {op}: expected {expected}, got {actual}")]
    DimensionMismatch {
        op: &'static str,
        expected: String,
        actual: String,
    },

    /// Mixture initialization kept producing singular covariances.
    #[error("degenerate initialization after {attempts} attempts")]
    DegenerateInitialization { attempts: usize },

    /// A division by zero or similar numeric breakdown.
    #[error("degenerate numeric result: {0}")]
    DegenerateNumeric(String),
}

impl VmlError {
    pub(crate) fn dims(op: &'static str, expected: impl ToString, actual: impl ToString) -> Self {
        VmlError::DimensionMismatch {
            op,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        VmlError::InvalidArgument(msg.into())
    }
}
