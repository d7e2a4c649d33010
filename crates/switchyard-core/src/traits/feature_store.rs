//! `IFeatureStore` trait: feature CRUD and filtered queries.
//!
//! Maps to `switchyard-storage/src/queries/features.rs`.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::StorageError;
use crate::types::{Feature, FeatureId, FeatureQuery, FeatureStatus, FeatureUpdate, NewFeature};

/// Feature table operations.
pub trait IFeatureStore: Send + Sync {
    /// Insert a feature. Fails with `UniqueViolation` when the name or
    /// identifier is taken.
    fn insert_feature(&self, feature: &NewFeature, now: DateTime<Utc>) -> Result<Feature, StorageError>;

    fn get_feature(&self, id: FeatureId) -> Result<Option<Feature>, StorageError>;

    fn find_feature(&self, identifier: &str) -> Result<Option<Feature>, StorageError>;

    /// All features matching every filter in `query`, ordered by id.
    fn query_features(&self, query: &FeatureQuery) -> Result<Vec<Feature>, StorageError>;

    /// Apply `update` to the feature. Returns the stored result, or `None`
    /// when no feature has that id.
    fn update_feature(
        &self,
        id: FeatureId,
        update: &FeatureUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Feature>, StorageError>;

    fn set_feature_status(
        &self,
        id: FeatureId,
        status: FeatureStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Feature>, StorageError>;

    /// Delete a feature and all of its assignments in one transaction.
    /// Returns the number of assignments removed, or `None` when no feature
    /// has that id.
    fn delete_feature(&self, id: FeatureId) -> Result<Option<usize>, StorageError>;

    fn count_features(&self) -> Result<i64, StorageError>;
}

impl<T: IFeatureStore + ?Sized> IFeatureStore for Arc<T> {
    fn insert_feature(&self, feature: &NewFeature, now: DateTime<Utc>) -> Result<Feature, StorageError> {
        (**self).insert_feature(feature, now)
    }
    fn get_feature(&self, id: FeatureId) -> Result<Option<Feature>, StorageError> {
        (**self).get_feature(id)
    }
    fn find_feature(&self, identifier: &str) -> Result<Option<Feature>, StorageError> {
        (**self).find_feature(identifier)
    }
    fn query_features(&self, query: &FeatureQuery) -> Result<Vec<Feature>, StorageError> {
        (**self).query_features(query)
    }
    fn update_feature(
        &self,
        id: FeatureId,
        update: &FeatureUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Feature>, StorageError> {
        (**self).update_feature(id, update, now)
    }
    fn set_feature_status(
        &self,
        id: FeatureId,
        status: FeatureStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Feature>, StorageError> {
        (**self).set_feature_status(id, status, now)
    }
    fn delete_feature(&self, id: FeatureId) -> Result<Option<usize>, StorageError> {
        (**self).delete_feature(id)
    }
    fn count_features(&self) -> Result<i64, StorageError> {
        (**self).count_features()
    }
}
