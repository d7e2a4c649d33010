//! Where the feature dependency definitions live.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DependencyConfig {
    /// YAML (`.yml`/`.yaml`) or TOML (`.toml`) file. `None` means no
    /// dependencies are configured.
    pub path: Option<PathBuf>,
}
