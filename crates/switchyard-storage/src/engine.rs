//! `SwitchyardStorageEngine`: the SQLite implementation of the core
//! storage traits.
//!
//! All reads go through `with_reader()`, all writes through `with_writer()`.
//! No code outside this crate touches a raw `&Connection`.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use switchyard_core::config::{AssignableConfig, StorageConfig};
use switchyard_core::errors::{ConfigError, StorageError};
use switchyard_core::traits::{AssignableRegistry, AssignmentActivity, IAssignmentStore, IFeatureStore};
use switchyard_core::types::{
    AssignableRef, AssignmentBatch, BulkWriteStats, Feature, FeatureAssignment, FeatureId,
    FeatureQuery, FeatureStatus, FeatureUpdate, NewFeature,
};
use tracing::info;

use crate::assignable_source::SqliteAssignableSource;
use crate::connection::DatabaseManager;
use crate::queries::{assignments, features};

pub struct SwitchyardStorageEngine {
    db: Arc<DatabaseManager>,
}

impl SwitchyardStorageEngine {
    /// Open a file-backed engine. Runs migrations and applies pragmas.
    pub fn open(path: &Path, config: &StorageConfig) -> Result<Self, StorageError> {
        Ok(Self {
            db: Arc::new(DatabaseManager::open(path, config)?),
        })
    }

    /// Open an in-memory engine (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            db: Arc::new(DatabaseManager::open_in_memory()?),
        })
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Ok(Self {
            db: Arc::new(DatabaseManager::from_config(config)?),
        })
    }

    /// Database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.db.path()
    }

    pub fn checkpoint(&self) -> Result<(), StorageError> {
        self.db.checkpoint()
    }

    /// Raw read access, for host-table work not covered by a trait method.
    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        self.db.with_reader(f)
    }

    /// Raw write access, for host-table work not covered by a trait method.
    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        self.db.with_writer(f)
    }

    /// A population source over a host table in this database.
    pub fn assignable_source(&self, config: &AssignableConfig) -> Result<SqliteAssignableSource, ConfigError> {
        SqliteAssignableSource::new(Arc::clone(&self.db), config)
    }

    /// Register every configured assignable type.
    pub fn register_assignables(
        &self,
        configs: &[AssignableConfig],
        registry: &mut AssignableRegistry,
    ) -> Result<(), ConfigError> {
        for config in configs {
            let source = self.assignable_source(config)?;
            info!(kind = %config.kind, table = %source.table(), "registered assignable type");
            registry.register(Arc::new(source));
        }
        Ok(())
    }
}

impl IFeatureStore for SwitchyardStorageEngine {
    fn insert_feature(&self, feature: &NewFeature, now: DateTime<Utc>) -> Result<Feature, StorageError> {
        self.db.with_writer(|conn| features::insert_feature(conn, feature, now))
    }

    fn get_feature(&self, id: FeatureId) -> Result<Option<Feature>, StorageError> {
        self.db.with_reader(|conn| features::get_feature(conn, id))
    }

    fn find_feature(&self, identifier: &str) -> Result<Option<Feature>, StorageError> {
        self.db.with_reader(|conn| features::find_feature(conn, identifier))
    }

    fn query_features(&self, query: &FeatureQuery) -> Result<Vec<Feature>, StorageError> {
        self.db.with_reader(|conn| features::query_features(conn, query))
    }

    fn update_feature(
        &self,
        id: FeatureId,
        update: &FeatureUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Feature>, StorageError> {
        self.db.with_writer(|conn| features::update_feature(conn, id, update, now))
    }

    fn set_feature_status(
        &self,
        id: FeatureId,
        status: FeatureStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Feature>, StorageError> {
        self.db.with_writer(|conn| features::set_feature_status(conn, id, status, now))
    }

    fn delete_feature(&self, id: FeatureId) -> Result<Option<usize>, StorageError> {
        self.db.with_writer(|conn| features::delete_feature(conn, id))
    }

    fn count_features(&self) -> Result<i64, StorageError> {
        self.db.with_reader(features::count_features)
    }
}

impl IAssignmentStore for SwitchyardStorageEngine {
    fn apply_batch(&self, batch: &AssignmentBatch, now: DateTime<Utc>) -> Result<BulkWriteStats, StorageError> {
        self.db.with_writer(|conn| assignments::apply_batch(conn, batch, now))
    }

    fn assign(&self, assignable: &AssignableRef, feature_id: FeatureId, now: DateTime<Utc>) -> Result<bool, StorageError> {
        self.db.with_writer(|conn| {
            assignments::assign(conn, &assignable.kind, assignable.id, feature_id, now)
        })
    }

    fn unassign(&self, assignable: &AssignableRef, feature_id: FeatureId) -> Result<bool, StorageError> {
        self.db
            .with_writer(|conn| assignments::unassign(conn, &assignable.kind, assignable.id, feature_id))
    }

    fn clear_assignments(&self, assignable: &AssignableRef) -> Result<usize, StorageError> {
        self.db
            .with_writer(|conn| assignments::clear_assignments(conn, &assignable.kind, assignable.id))
    }

    fn has_assignment(&self, assignable: &AssignableRef, feature_ids: &[FeatureId]) -> Result<bool, StorageError> {
        self.db.with_reader(|conn| {
            assignments::has_assignment(conn, &assignable.kind, assignable.id, feature_ids)
        })
    }

    fn assigned_feature_ids(&self, assignable: &AssignableRef) -> Result<Vec<FeatureId>, StorageError> {
        self.db
            .with_reader(|conn| assignments::assigned_feature_ids(conn, &assignable.kind, assignable.id))
    }

    fn assignments_for_feature(&self, feature_id: FeatureId) -> Result<Vec<FeatureAssignment>, StorageError> {
        self.db
            .with_reader(|conn| assignments::assignments_for_feature(conn, feature_id))
    }

    fn assignments_for_type(&self, kind: &str) -> Result<Vec<FeatureAssignment>, StorageError> {
        self.db.with_reader(|conn| assignments::assignments_for_type(conn, kind))
    }

    fn assignable_types_for_feature(&self, feature_id: FeatureId) -> Result<Vec<String>, StorageError> {
        self.db
            .with_reader(|conn| assignments::assignable_types_for_feature(conn, feature_id))
    }

    fn activity_for(
        &self,
        feature_id: FeatureId,
        kind: &str,
        now: DateTime<Utc>,
    ) -> Result<AssignmentActivity, StorageError> {
        self.db
            .with_reader(|conn| assignments::activity_for(conn, feature_id, kind, now))
    }

    fn count_assignments(&self) -> Result<i64, StorageError> {
        self.db.with_reader(assignments::count_assignments)
    }
}
