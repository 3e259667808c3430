//! Error types for dynamics model operations

use thiserror::Error;

/// Result type for dynamics model operations
pub type DynamicsResult<T> = Result<T, DynamicsError>;

/// Errors that can occur while learning or querying a dynamics model
#[derive(Error, Debug)]
pub enum DynamicsError {
    /// No transitions were supplied to `learn`
    #[error("No transitions supplied")]
    EmptyInput,

    /// A vector length differs from the length established by the first transition
    /// (or by the configuration)
    #[error("Dimension mismatch in {field} at index {index}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Which quantity was inconsistent (`state`, `action`, `target`, `query`, ...)
        field: &'static str,
        /// Index of the offending transition (0 for non-indexed checks)
        index: usize,
        /// Expected length
        expected: usize,
        /// Actual length
        found: usize,
    },

    /// One output dimension's regressor failed to fit
    #[error("Fit failed for output dimension {dimension}: {cause}")]
    FitFailure {
        /// Output dimension whose regressor failed
        dimension: usize,
        /// Underlying regressor error
        #[source]
        cause: RegressorError,
    },

    /// Query or save before any successful `learn`
    #[error("Model has not been fitted")]
    NotFitted,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed snapshot file
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a single-output regressor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegressorError {
    /// Fit called without samples
    #[error("Empty training set")]
    EmptyTrainingSet,

    /// Samples, targets or noise are inconsistent or non-finite
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Cholesky factorization of the covariance failed
    #[error("Covariance matrix of size {size} is not positive definite")]
    NotPositiveDefinite {
        /// Order of the covariance matrix
        size: usize,
    },

    /// Hyperparameter optimization produced no usable point
    #[error("Optimization diverged: {0}")]
    OptimizationDiverged(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = DynamicsError::DimensionMismatch {
            field: "state",
            index: 3,
            expected: 2,
            found: 4,
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch in state at index 3: expected 2, found 4"
        );
        assert_eq!(
            DynamicsError::NotFitted.to_string(),
            "Model has not been fitted"
        );
    }

    #[test]
    fn test_fit_failure_source() {
        let err = DynamicsError::FitFailure {
            dimension: 1,
            cause: RegressorError::NotPositiveDefinite { size: 2 },
        };
        assert!(err.to_string().contains("dimension 1"));
        let source = err.source().unwrap();
        assert!(source.to_string().contains("size 2"));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DynamicsError = io.into();
        assert!(matches!(err, DynamicsError::Io(_)));
    }
}
