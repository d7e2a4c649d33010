//! Stable error codes shared by every error enum.
//!
//! Codes are part of the public contract: callers match on them for
//! diagnostics and metrics, so they never change once released.

/// Implemented by every Switchyard error enum.
pub trait ErrorCode {
    /// The stable machine-readable code for this error.
    fn error_code(&self) -> &'static str;
}

// ── Storage ──
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const DB_BUSY: &str = "DB_BUSY";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const UNIQUE_VIOLATION: &str = "UNIQUE_VIOLATION";
pub const ROW_NOT_FOUND: &str = "ROW_NOT_FOUND";
pub const NOT_SUPPORTED: &str = "NOT_SUPPORTED";

// ── Config ──
pub const CONFIG_IO: &str = "CONFIG_IO";
pub const CONFIG_PARSE: &str = "CONFIG_PARSE";
pub const CONFIG_DEPENDENCY_CYCLE: &str = "CONFIG_DEPENDENCY_CYCLE";
pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

// ── Toggle ──
pub const FEATURE_NOT_FOUND: &str = "FEATURE_NOT_FOUND";
pub const ASSIGNABLES_NOT_FOUND: &str = "ASSIGNABLES_NOT_FOUND";
pub const BULK_TOGGLE_FAILED: &str = "BULK_TOGGLE_FAILED";
pub const UNKNOWN_ASSIGNABLE_TYPE: &str = "UNKNOWN_ASSIGNABLE_TYPE";
pub const DEPENDENCY_MISSING: &str = "DEPENDENCY_MISSING";
pub const INVALID_PERCENTAGE: &str = "INVALID_PERCENTAGE";
pub const INVALID_INPUT: &str = "INVALID_INPUT";
