//! Feature operations on a single assignable.

use std::sync::Arc;

use chrono::Utc;
use switchyard_core::errors::{ToggleError, ToggleResult};
use switchyard_core::traits::IAssignmentStore;
use switchyard_core::types::{AssignableRef, Feature, FeatureQuery, FeatureStatus};
use switchyard_core::DependencyIndex;
use tracing::debug;

use crate::resolver::{FeatureRef, FeatureResolver};

/// Handle for one assignable. Obtained from `Switchyard::assignable`, which
/// checks that the type is registered and the row exists.
///
/// The dependency index is captured when the handle is created; a later
/// reload is not seen by an existing handle.
pub struct AssignableFeatures {
    target: AssignableRef,
    resolver: FeatureResolver,
    assignments: Arc<dyn IAssignmentStore>,
    dependencies: Arc<DependencyIndex>,
}

impl AssignableFeatures {
    pub fn new(
        target: AssignableRef,
        resolver: FeatureResolver,
        assignments: Arc<dyn IAssignmentStore>,
        dependencies: Arc<DependencyIndex>,
    ) -> Self {
        Self {
            target,
            resolver,
            assignments,
            dependencies,
        }
    }

    pub fn target(&self) -> &AssignableRef {
        &self.target
    }

    /// Assign the feature. Returns `false` when the row already existed.
    pub fn enable(&self, feature: impl Into<FeatureRef>) -> ToggleResult<bool> {
        let feature = self.resolver.require_ref(feature.into())?;
        let created = self.assignments.assign(&self.target, feature.id, Utc::now())?;
        debug!(assignable = %self.target, feature = %feature.identifier, created, "enable");
        Ok(created)
    }

    /// Remove the assignment. Returns `false` when there was none.
    pub fn disable(&self, feature: impl Into<FeatureRef>) -> ToggleResult<bool> {
        let feature = self.resolver.require_ref(feature.into())?;
        let removed = self.assignments.unassign(&self.target, feature.id)?;
        debug!(assignable = %self.target, feature = %feature.identifier, removed, "disable");
        Ok(removed)
    }

    /// Remove every assignment this assignable holds.
    pub fn clear(&self) -> ToggleResult<usize> {
        Ok(self.assignments.clear_assignments(&self.target)?)
    }

    /// Whether an assignment row exists, regardless of feature status.
    pub fn has_direct_feature(&self, feature: impl Into<FeatureRef>) -> ToggleResult<bool> {
        let feature = self.resolver.require_ref(feature.into())?;
        Ok(self.assignments.has_assignment(&self.target, &[feature.id])?)
    }

    /// Whether the assignable holds an active feature that is either this
    /// one or depends on it.
    pub fn has_effective_feature(&self, feature: impl Into<FeatureRef>) -> ToggleResult<bool> {
        let feature = self.resolver.require_ref(feature.into())?;
        self.effectively_holds(&feature.identifier)
    }

    /// Features directly assigned, ordered by id.
    pub fn features(&self) -> ToggleResult<Vec<Feature>> {
        let mut features = Vec::new();
        for id in self.assignments.assigned_feature_ids(&self.target)? {
            if let Some(feature) = self.resolver.get(id)? {
                features.push(feature);
            }
        }
        features.sort_by_key(|f| f.id);
        Ok(features)
    }

    /// Fail with `DependencyMissing` naming the first transitive dependency
    /// of `identifier` this assignable does not effectively hold. A
    /// dependency with no stored feature is never held.
    pub fn verify_dependencies(&self, identifier: &str) -> ToggleResult<()> {
        for required in self.dependencies.dependencies_for(identifier) {
            let held = match self.resolver.find(required)? {
                Some(feature) => self.effectively_holds(&feature.identifier)?,
                None => false,
            };
            if !held {
                return Err(ToggleError::DependencyMissing {
                    feature: identifier.to_string(),
                    required: required.clone(),
                });
            }
        }
        Ok(())
    }

    fn effectively_holds(&self, identifier: &str) -> ToggleResult<bool> {
        let mut identifiers = vec![identifier.to_string()];
        identifiers.extend(self.dependencies.dependents_of(identifier).iter().cloned());

        let query = FeatureQuery::new()
            .identifiers(&identifiers)
            .status(FeatureStatus::Active);
        let ids: Vec<_> = self.resolver.resolve(&query)?.iter().map(|f| f.id).collect();
        if ids.is_empty() {
            return Ok(false);
        }
        Ok(self.assignments.has_assignment(&self.target, &ids)?)
    }
}
