//! Reading dependency definitions from YAML or TOML.
//!
//! Both shapes are accepted:
//!
//! ```yaml
//! feature_dependency:
//!   checkout_v2: [payments, cart]
//! ```
//!
//! and the same mapping without the `feature_dependency` wrapper. A feature
//! listed with no value has no dependencies.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::index::DependencyIndex;
use crate::errors::ConfigError;

/// Top-level key the definitions may be nested under.
const NESTED_KEY: &str = "feature_dependency";

type DirectDefinitions = BTreeMap<String, Option<Vec<String>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyFormat {
    Yaml,
    Toml,
}

impl DependencyFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::Invalid {
                field: "dependencies.path".into(),
                message: format!(
                    "unsupported dependency file extension {:?} (expected yml, yaml or toml)",
                    other.unwrap_or("")
                ),
            }),
        }
    }
}

impl DependencyIndex {
    /// Load and build the index from a file.
    ///
    /// A missing file yields an empty index. Unparseable content and
    /// dependency cycles are errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = DependencyFormat::from_path(path)?;
        if !path.exists() {
            debug!(path = %path.display(), "no feature dependency file, using empty index");
            return Ok(Self::empty());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let direct = parse_dependencies(&raw, format).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        let index = Self::from_direct(direct)?;
        info!(path = %path.display(), features = index.len(), "loaded feature dependencies");
        Ok(index)
    }

    /// Build the index from in-memory YAML or TOML text.
    pub fn from_source(raw: &str, format: DependencyFormat) -> Result<Self, ConfigError> {
        let direct = parse_dependencies(raw, format).map_err(|message| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message,
        })?;
        Self::from_direct(direct)
    }
}

/// Parse direct definitions. Blank input yields no definitions.
pub fn parse_dependencies(
    raw: &str,
    format: DependencyFormat,
) -> Result<BTreeMap<String, Vec<String>>, String> {
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let definitions = match format {
        DependencyFormat::Yaml => parse_yaml(raw)?,
        DependencyFormat::Toml => parse_toml(raw)?,
    };
    Ok(definitions
        .into_iter()
        .map(|(feature, deps)| (feature, deps.unwrap_or_default()))
        .collect())
}

fn parse_yaml(raw: &str) -> Result<DirectDefinitions, String> {
    let mut value: serde_yaml::Value = serde_yaml::from_str(raw).map_err(|e| e.to_string())?;
    if let Some(nested) = value
        .as_mapping_mut()
        .and_then(|m| m.remove(NESTED_KEY))
    {
        value = nested;
    }
    if value.is_null() {
        return Ok(DirectDefinitions::new());
    }
    serde_yaml::from_value(value).map_err(|e| e.to_string())
}

fn parse_toml(raw: &str) -> Result<DirectDefinitions, String> {
    let mut table: toml::Table = raw.parse().map_err(|e: toml::de::Error| e.to_string())?;
    let value = match table.remove(NESTED_KEY) {
        Some(nested) => nested,
        None => toml::Value::Table(table),
    };
    value.try_into().map_err(|e: toml::de::Error| e.to_string())
}
