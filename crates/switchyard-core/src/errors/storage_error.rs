//! Storage-layer errors for SQLite operations.

use super::error_code::{self, ErrorCode};

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Database busy (another operation in progress)")]
    DbBusy,

    #[error("Unique constraint violated on {table}.{column}: {value}")]
    UniqueViolation {
        table: String,
        column: String,
        value: String,
    },

    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    #[error("Operation not supported: {operation}: {reason}")]
    NotSupported { operation: String, reason: String },
}

impl StorageError {
    /// Wrap any displayable failure as a `SqliteError`.
    pub fn sqlite(e: impl std::fmt::Display) -> Self {
        Self::SqliteError {
            message: e.to_string(),
        }
    }
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DbBusy => error_code::DB_BUSY,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::UniqueViolation { .. } => error_code::UNIQUE_VIOLATION,
            Self::NotFound { .. } => error_code::ROW_NOT_FOUND,
            Self::NotSupported { .. } => error_code::NOT_SUPPORTED,
            Self::SqliteError { .. } => error_code::STORAGE_ERROR,
        }
    }
}
