//! Errors surfaced to callers of the toggle engine.

use super::config_error::ConfigError;
use super::error_code::{self, ErrorCode};
use super::storage_error::StorageError;

/// Caller-facing errors. All are recoverable by the caller; none are retried
/// internally.
#[derive(Debug, thiserror::Error)]
pub enum ToggleError {
    #[error("Feature not found: {criteria}")]
    FeatureNotFound { criteria: String },

    #[error("No {kind} assignables matched the bulk operation")]
    AssignablesNotFound { kind: String },

    #[error("{message}")]
    BulkToggleFailed {
        message: String,
        #[source]
        source: StorageError,
    },

    #[error("Unknown assignable type: {kind}")]
    UnknownAssignableType { kind: String },

    #[error("Feature '{feature}' is missing dependency: '{required}'")]
    DependencyMissing { feature: String, required: String },

    #[error("Percentage must be a finite number between 0 and 100, got {value}")]
    InvalidPercentage { value: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ToggleError {
    pub fn feature_not_found(criteria: impl Into<String>) -> Self {
        Self::FeatureNotFound {
            criteria: criteria.into(),
        }
    }
}

impl ErrorCode for ToggleError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::FeatureNotFound { .. } => error_code::FEATURE_NOT_FOUND,
            Self::AssignablesNotFound { .. } => error_code::ASSIGNABLES_NOT_FOUND,
            Self::BulkToggleFailed { .. } => error_code::BULK_TOGGLE_FAILED,
            Self::UnknownAssignableType { .. } => error_code::UNKNOWN_ASSIGNABLE_TYPE,
            Self::DependencyMissing { .. } => error_code::DEPENDENCY_MISSING,
            Self::InvalidPercentage { .. } => error_code::INVALID_PERCENTAGE,
            Self::InvalidInput(_) => error_code::INVALID_INPUT,
            Self::Config(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
        }
    }
}
