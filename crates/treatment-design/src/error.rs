//! Custom error types for treatment design.
//!
//! This module provides the error hierarchy using `thiserror`. Only failures
//! that invalidate a whole `fit` or `transform` call live here; problems with
//! a single column are reported as [`crate::types::SkippedColumn`] values
//! instead, so one odd column never aborts the batch.
//!
//! Errors are serializable so callers can forward them as `{code, message}`
//! pairs.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for treatment design.
#[derive(Error, Debug)]
pub enum TreatmentError {
    /// A configured column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// `transform` was called before any successful `fit`.
    #[error("Treatment design has not been fitted")]
    NotFitted,

    /// The table cannot be treated (no columns).
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

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
        source: Box<TreatmentError>,
    },
}

impl TreatmentError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        TreatmentError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for callers that branch on the failure kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NotFitted => "NOT_FITTED",
            Self::SchemaMismatch(_) => "SCHEMA_MISMATCH",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by calling operations in the wrong order.
    pub fn is_not_fitted(&self) -> bool {
        match self {
            Self::NotFitted => true,
            Self::WithContext { source, .. } => source.is_not_fitted(),
            _ => false,
        }
    }

    /// Check if the caller can fix this error by changing the configuration.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::ColumnNotFound(_) | Self::InvalidConfig(_) => true,
            Self::WithContext { source, .. } => source.is_configuration_error(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for TreatmentError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        TreatmentError::InvalidConfig(err.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for TreatmentError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("TreatmentError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for treatment design operations.
pub type Result<T> = std::result::Result<T, TreatmentError>;

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
        self.map_err(|e| TreatmentError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(TreatmentError::NotFitted.error_code(), "NOT_FITTED");
        assert_eq!(
            TreatmentError::ColumnNotFound("test".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_is_not_fitted() {
        assert!(TreatmentError::NotFitted.is_not_fitted());
        assert!(TreatmentError::NotFitted.with_context("transform").is_not_fitted());
        assert!(!TreatmentError::InvalidConfig("x".to_string()).is_not_fitted());
    }

    #[test]
    fn test_is_configuration_error() {
        assert!(TreatmentError::ColumnNotFound("id".to_string()).is_configuration_error());
        assert!(TreatmentError::InvalidConfig("x".to_string()).is_configuration_error());
        assert!(!TreatmentError::SchemaMismatch("x".to_string()).is_configuration_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = TreatmentError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context() {
        let error = TreatmentError::ColumnNotFound("test".to_string()).with_context("During fit");
        assert!(error.to_string().contains("During fit"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND"); // Preserves original code
    }
}
