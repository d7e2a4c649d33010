//! Configuration errors: config files, dependency definitions, registry setup.

use std::path::PathBuf;

use super::error_code::{self, ErrorCode};

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Feature dependency cycle: {}", path.join(" -> "))]
    DependencyCycle { path: Vec<String> },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: String, message: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::CONFIG_IO,
            Self::Parse { .. } => error_code::CONFIG_PARSE,
            Self::DependencyCycle { .. } => error_code::CONFIG_DEPENDENCY_CYCLE,
            Self::Invalid { .. } => error_code::CONFIG_INVALID,
        }
    }
}
