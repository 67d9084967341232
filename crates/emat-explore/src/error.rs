//! Custom error types for the exploration views.
//!
//! This module provides the error hierarchy using `thiserror`. Conditions
//! that are advisory (an unknown chart column, an expression that fails to
//! parse) are logged and swallowed by the views; the variants here are the
//! ones that are fatal to the call that produced them.
//!
//! Errors are serializable so a host UI can display them.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the exploration views.
#[derive(Error, Debug)]
pub enum ExploreError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Column is not declared in the scope.
    #[error("Column '{0}' not found in scope")]
    NotInScope(String),

    /// A selection mask does not line up with the dataset rows.
    #[error("Selection size ({actual}) does not match length of data ({expected})")]
    MaskLengthMismatch { expected: usize, actual: usize },

    /// No domain could be resolved for a range selector.
    #[error("Cannot build a selector for '{column}': {bound} value unknown")]
    MissingDomain { column: String, bound: &'static str },

    /// A row expression failed to parse or evaluate.
    #[error("Invalid selection expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// A selector operation does not match the column's control kind.
    #[error("Column '{column}' is not controlled by a {expected} selector")]
    WrongSelector { column: String, expected: &'static str },

    /// An operation needed a selection box but none is attached.
    #[error("No selection box is attached to this view")]
    NoBox,

    /// No valid values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ExploreError>,
    },
}

impl ExploreError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ExploreError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub(crate) fn mask_length(expected: usize, actual: usize) -> Self {
        ExploreError::MaskLengthMismatch { expected, actual }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NotInScope(_) => "NOT_IN_SCOPE",
            Self::MaskLengthMismatch { .. } => "MASK_LENGTH_MISMATCH",
            Self::MissingDomain { .. } => "MISSING_DOMAIN",
            Self::InvalidExpression { .. } => "INVALID_EXPRESSION",
            Self::WrongSelector { .. } => "WRONG_SELECTOR",
            Self::NoBox => "NO_BOX",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Advisory errors are the ones a view may log and skip instead of
    /// failing the surrounding operation.
    pub fn is_advisory(&self) -> bool {
        match self {
            Self::ColumnNotFound(_) | Self::NotInScope(_) | Self::InvalidExpression { .. } => true,
            Self::WithContext { source, .. } => source.is_advisory(),
            _ => false,
        }
    }
}

impl Serialize for ExploreError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ExploreError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for exploration operations.
pub type Result<T> = std::result::Result<T, ExploreError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ExploreError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ExploreError::ColumnNotFound("A".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(ExploreError::mask_length(3, 2).error_code(), "MASK_LENGTH_MISMATCH");
    }

    #[test]
    fn test_mask_length_message() {
        let msg = ExploreError::mask_length(1000, 10).to_string();
        assert!(msg.contains("(10)"));
        assert!(msg.contains("(1000)"));
    }

    #[test]
    fn test_is_advisory() {
        assert!(ExploreError::ColumnNotFound("x".into()).is_advisory());
        assert!(ExploreError::NotInScope("x".into()).is_advisory());
        assert!(!ExploreError::mask_length(1, 2).is_advisory());
        assert!(!ExploreError::NoBox.is_advisory());
    }

    #[test]
    fn test_error_serialization() {
        let error = ExploreError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context() {
        let error = ExploreError::NotInScope("x".to_string()).with_context("Building selectors");
        assert!(error.to_string().contains("Building selectors"));
        assert_eq!(error.error_code(), "NOT_IN_SCOPE");
        assert!(error.is_advisory());
    }
}
