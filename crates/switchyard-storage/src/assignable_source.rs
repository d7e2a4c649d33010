//! `AssignableSource` backed by a table in the same SQLite database.

use std::sync::Arc;

use switchyard_core::config::AssignableConfig;
use switchyard_core::errors::{ConfigError, StorageError};
use switchyard_core::traits::AssignableSource;
use switchyard_core::types::{AssignableId, FeatureId};

use crate::connection::DatabaseManager;
use crate::queries::assignables::{self, HostTable};

/// A registered host table, e.g. kind `User` → table `users`, column `id`.
pub struct SqliteAssignableSource {
    db: Arc<DatabaseManager>,
    kind: String,
    table: String,
    id_column: String,
}

impl SqliteAssignableSource {
    /// Fails when the table or column is not a plain SQL identifier.
    pub fn new(db: Arc<DatabaseManager>, config: &AssignableConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            db,
            kind: config.kind.clone(),
            table: config.table.clone(),
            id_column: config.effective_id_column().to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn host(&self) -> HostTable<'_> {
        HostTable {
            kind: &self.kind,
            table: &self.table,
            id_column: &self.id_column,
        }
    }
}

impl AssignableSource for SqliteAssignableSource {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn with_features(&self, feature_ids: &[FeatureId]) -> Result<Vec<AssignableId>, StorageError> {
        self.db
            .with_reader(|conn| assignables::with_features(conn, self.host(), feature_ids))
    }

    fn without_features(&self, feature_ids: &[FeatureId]) -> Result<Vec<AssignableId>, StorageError> {
        self.db
            .with_reader(|conn| assignables::without_features(conn, self.host(), feature_ids))
    }

    fn count(&self) -> Result<i64, StorageError> {
        self.db.with_reader(|conn| assignables::count(conn, self.host()))
    }

    fn exists(&self, id: AssignableId) -> Result<bool, StorageError> {
        self.db.with_reader(|conn| assignables::exists(conn, self.host(), id))
    }
}
