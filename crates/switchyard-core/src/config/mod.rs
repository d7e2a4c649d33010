pub mod assignable_config;
pub mod dependency_config;
pub mod logging_config;
pub mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub use assignable_config::{validate_sql_identifier, AssignableConfig};
pub use dependency_config::DependencyConfig;
pub use logging_config::LoggingConfig;
pub use storage_config::StorageConfig;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SwitchyardConfig {
    pub storage: StorageConfig,
    pub dependencies: DependencyConfig,
    pub logging: LoggingConfig,
    /// Assignable types registered at startup.
    pub assignables: Vec<AssignableConfig>,
}

impl SwitchyardConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Read and parse a TOML config file, then validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut kinds = std::collections::BTreeSet::new();
        for assignable in &self.assignables {
            assignable.validate()?;
            if !kinds.insert(assignable.kind.as_str()) {
                return Err(ConfigError::Invalid {
                    field: "assignables.kind".into(),
                    message: format!("'{}' is registered twice", assignable.kind),
                });
            }
        }
        Ok(())
    }
}
