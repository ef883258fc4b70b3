//! Error types for response validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using the validation error
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// A fatal validation violation.
///
/// Only the first violation of a pass is raised; advisory findings are
/// reported as [`crate::report::Warning`] instead.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Expected status {expected}, got {actual}")]
    StatusMismatch { expected: u16, actual: u16 },

    #[error("Missing property: {key} (at {path})")]
    MissingProperty { key: String, path: String },

    #[error("{key} should be an array (at {path})")]
    NotAnArray { key: String, path: String },

    #[error("{key} should be an object (at {path})")]
    NotAnObject { key: String, path: String },

    #[error("{path} should be of type {expected}, got {actual}")]
    ElementTypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Value mismatch for {key}. Expected: {expected}, Got: {actual} (at {path})")]
    ValueMismatch {
        key: String,
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Field {path} {reason}")]
    EmptyField { path: String, reason: String },

    #[error("Amount field {path} is not a valid number: {value}")]
    InvalidAmount { path: String, value: String },

    #[error("Amount field {path} is out of reasonable bounds: {value}")]
    AmountOutOfBounds { path: String, value: String },

    #[error("Transaction ID field {path} {reason}: {value}")]
    InvalidTransactionId {
        path: String,
        value: String,
        reason: String,
    },

    #[error("Custom validation '{rule}' failed for {path}: {reason}")]
    RuleFailed {
        rule: String,
        path: String,
        reason: String,
    },

    #[error("Invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
}

/// Coarse classification of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Actual structure differs from the expected structure
    Shape,
    /// Correctly shaped field holding the wrong value
    Value,
    /// Domain classifier, non-empty or custom rule failure
    Classifier,
    /// Expectation document could not be loaded or understood
    Document,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Shape => write!(f, "shape"),
            ErrorCategory::Value => write!(f, "value"),
            ErrorCategory::Classifier => write!(f, "classifier"),
            ErrorCategory::Document => write!(f, "document"),
        }
    }
}

impl ValidationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ValidationError::MissingProperty { .. }
            | ValidationError::NotAnArray { .. }
            | ValidationError::NotAnObject { .. }
            | ValidationError::ElementTypeMismatch { .. } => ErrorCategory::Shape,
            ValidationError::StatusMismatch { .. } | ValidationError::ValueMismatch { .. } => {
                ErrorCategory::Value
            }
            ValidationError::EmptyField { .. }
            | ValidationError::InvalidAmount { .. }
            | ValidationError::AmountOutOfBounds { .. }
            | ValidationError::InvalidTransactionId { .. }
            | ValidationError::RuleFailed { .. } => ErrorCategory::Classifier,
            ValidationError::InvalidPath { .. }
            | ValidationError::Io(_)
            | ValidationError::Json(_)
            | ValidationError::Yaml(_)
            | ValidationError::UnsupportedFormat(_) => ErrorCategory::Document,
        }
    }

    /// Field path the violation refers to, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            ValidationError::MissingProperty { path, .. }
            | ValidationError::NotAnArray { path, .. }
            | ValidationError::NotAnObject { path, .. }
            | ValidationError::ElementTypeMismatch { path, .. }
            | ValidationError::ValueMismatch { path, .. }
            | ValidationError::EmptyField { path, .. }
            | ValidationError::InvalidAmount { path, .. }
            | ValidationError::AmountOutOfBounds { path, .. }
            | ValidationError::InvalidTransactionId { path, .. }
            | ValidationError::RuleFailed { path, .. }
            | ValidationError::InvalidPath { path, .. } => Some(path),
            _ => None,
        }
    }
}
