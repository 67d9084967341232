//! Error types for the emat-multitarget crate.
//!
//! This module defines [`RegressionError`], the main error type used throughout
//! the crate. All public API functions return `Result<T, RegressionError>`.
//!
//! # Error Handling
//!
//! Errors are designed to be:
//! - **Descriptive**: Each variant includes context about what went wrong
//! - **Serializable**: Each variant maps to a stable code for host UIs
//!
//! # Example
//!
//! ```no_run
//! use emat_multitarget::{RegressorConfig, RegressionError};
//!
//! fn configure() -> Result<(), RegressionError> {
//!     let config = RegressorConfig::builder()
//!         .n_restarts_optimizer(10)
//!         .build()?;
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for emat-multitarget operations.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RegressionError {
    /// Invalid configuration provided to a regressor.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A prediction or score was requested before `fit`.
    #[error("This model instance is not fitted yet; call `fit` first")]
    NotFitted,

    /// A prediction variant that is not supported.
    ///
    /// Carries the name of the offending option (`return_std` or `return_cov`).
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// Invalid data provided for fitting or prediction.
    ///
    /// Common causes:
    /// - Input contains null, NaN or infinite values
    /// - Too few rows to fit the model
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Two inputs that must line up do not.
    #[error("Shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Which dimension disagreed.
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The numeric solver failed (singular system, non positive definite kernel).
    #[error("Solver failed: {0}")]
    Solver(String),

    /// Polars error while converting a DataFrame.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl RegressionError {
    pub(crate) fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        RegressionError::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NotFitted => "NOT_FITTED",
            Self::NotImplemented(_) => "NOT_IMPLEMENTED",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            Self::Solver(_) => "SOLVER_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
        }
    }
}

impl Serialize for RegressionError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("RegressionError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for regression operations.
pub type Result<T> = std::result::Result<T, RegressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            RegressionError::NotImplemented("return_std").to_string(),
            "return_std is not implemented"
        );
        let err = RegressionError::shape("rows", 10, 9);
        assert_eq!(err.to_string(), "Shape mismatch for rows: expected 10, got 9");
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_string(&RegressionError::NotFitted).unwrap();
        assert!(json.contains(r#""code":"NOT_FITTED""#));
        assert!(json.contains("call `fit` first"));
    }
}
