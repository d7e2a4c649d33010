//! Error types for every Switchyard layer.
//! One enum per concern, each carrying a stable error code.

pub mod config_error;
pub mod error_code;
pub mod storage_error;
pub mod toggle_error;

pub use config_error::ConfigError;
pub use storage_error::StorageError;
pub use toggle_error::ToggleError;

/// Result alias for operations that surface a [`ToggleError`].
pub type ToggleResult<T> = Result<T, ToggleError>;
