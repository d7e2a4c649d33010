//! Feature lifecycle: create, update, status changes, destroy.

use std::sync::Arc;

use chrono::Utc;
use switchyard_core::errors::{ToggleError, ToggleResult};
use switchyard_core::traits::IFeatureStore;
use switchyard_core::types::{Feature, FeatureQuery, FeatureStatus, FeatureUpdate, NewFeature};
use tracing::info;

/// Feature CRUD keyed by identifier. Every operation on an existing feature
/// fails with `FeatureNotFound` when the identifier is unknown.
#[derive(Clone)]
pub struct FeatureManager {
    store: Arc<dyn IFeatureStore>,
}

impl FeatureManager {
    pub fn new(store: Arc<dyn IFeatureStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, feature: NewFeature) -> ToggleResult<Feature> {
        feature.validate()?;
        let created = self.store.insert_feature(&feature, Utc::now())?;
        info!(identifier = %created.identifier, status = %created.status, "feature created");
        Ok(created)
    }

    pub fn update(&self, identifier: &str, update: FeatureUpdate) -> ToggleResult<Feature> {
        if matches!(&update.name, Some(name) if name.trim().is_empty()) {
            return Err(ToggleError::InvalidInput("feature name must not be blank".into()));
        }
        let current = self.feature(identifier)?;
        if update.is_empty() {
            return Ok(current);
        }
        self.store
            .update_feature(current.id, &update, Utc::now())?
            .ok_or_else(|| not_found(identifier))
    }

    /// Delete the feature and every assignment of it. Returns the number of
    /// assignments removed.
    pub fn destroy(&self, identifier: &str) -> ToggleResult<usize> {
        let current = self.feature(identifier)?;
        let removed = self
            .store
            .delete_feature(current.id)?
            .ok_or_else(|| not_found(identifier))?;
        info!(identifier, assignments = removed, "feature destroyed");
        Ok(removed)
    }

    /// Flip active ↔ inactive.
    pub fn toggle(&self, identifier: &str) -> ToggleResult<Feature> {
        let current = self.feature(identifier)?;
        self.set_status(identifier, &current, current.status.toggled())
    }

    pub fn activate(&self, identifier: &str) -> ToggleResult<Feature> {
        let current = self.feature(identifier)?;
        self.set_status(identifier, &current, FeatureStatus::Active)
    }

    pub fn inactivate(&self, identifier: &str) -> ToggleResult<Feature> {
        let current = self.feature(identifier)?;
        self.set_status(identifier, &current, FeatureStatus::Inactive)
    }

    pub fn feature(&self, identifier: &str) -> ToggleResult<Feature> {
        self.store
            .find_feature(identifier)?
            .ok_or_else(|| not_found(identifier))
    }

    pub fn features(&self) -> ToggleResult<Vec<Feature>> {
        Ok(self.store.query_features(&FeatureQuery::new())?)
    }

    fn set_status(&self, identifier: &str, current: &Feature, status: FeatureStatus) -> ToggleResult<Feature> {
        let updated = self
            .store
            .set_feature_status(current.id, status, Utc::now())?
            .ok_or_else(|| not_found(identifier))?;
        if updated.status != current.status {
            info!(identifier, from = %current.status, to = %updated.status, "feature status changed");
        }
        Ok(updated)
    }
}

fn not_found(identifier: &str) -> ToggleError {
    ToggleError::feature_not_found(format!("identifier '{identifier}'"))
}
