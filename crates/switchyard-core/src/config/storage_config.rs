//! Storage subsystem configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the SQLite store.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file. `None` opens an in-memory database.
    pub path: Option<PathBuf>,
    /// Reader connections for file-backed databases. Default: 2.
    pub read_pool_size: Option<usize>,
    /// SQLite busy timeout in milliseconds. Default: 5000.
    pub busy_timeout_ms: Option<u32>,
}

impl StorageConfig {
    pub fn effective_read_pool_size(&self) -> usize {
        match self.read_pool_size {
            Some(0) | None => 2,
            Some(n) => n,
        }
    }

    pub fn effective_busy_timeout_ms(&self) -> u32 {
        self.busy_timeout_ms.unwrap_or(5000)
    }
}
