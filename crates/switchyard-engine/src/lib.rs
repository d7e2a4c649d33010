//! # switchyard-engine
//!
//! Feature resolution, bulk toggling and adoption analytics over the
//! storage traits in `switchyard-core`, plus the [`Switchyard`] facade that
//! wires them to a SQLite engine.

pub mod analytics;
pub mod assignable;
pub mod bulk;
pub mod manager;
pub mod resolver;

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use switchyard_core::errors::ToggleResult;
use switchyard_core::traits::{AssignableRegistry, IAssignmentStore, IFeatureStore};
use switchyard_core::types::{AssignableRef, Feature, FeatureAssignment, FeatureQuery, FeatureUpdate, NewFeature};
use switchyard_core::{DependencyIndex, SwitchyardConfig};
use switchyard_storage::SwitchyardStorageEngine;
use tracing::info;

pub use analytics::{format_percentage, Analytics, AnalyticsRecord};
pub use assignable::AssignableFeatures;
pub use bulk::{sample, sample_size, validate_percentage, BulkFilters, BulkToggleReport, BulkToggler};
pub use manager::FeatureManager;
pub use resolver::{FeatureRef, FeatureResolver};

/// Entry point tying together feature storage, assignment storage, the
/// assignable registry and the dependency index.
pub struct Switchyard {
    features: Arc<dyn IFeatureStore>,
    assignments: Arc<dyn IAssignmentStore>,
    registry: Arc<AssignableRegistry>,
    dependencies: RwLock<Arc<DependencyIndex>>,
}

impl Switchyard {
    pub fn new(
        features: Arc<dyn IFeatureStore>,
        assignments: Arc<dyn IAssignmentStore>,
        registry: AssignableRegistry,
        dependencies: DependencyIndex,
    ) -> Self {
        Self {
            features,
            assignments,
            registry: Arc::new(registry),
            dependencies: RwLock::new(Arc::new(dependencies)),
        }
    }

    /// Build over an existing engine: registers `config.assignables` against
    /// the engine's database and loads the dependency file, if configured.
    pub fn from_engine(engine: Arc<SwitchyardStorageEngine>, config: &SwitchyardConfig) -> ToggleResult<Self> {
        let mut registry = AssignableRegistry::new();
        engine.register_assignables(&config.assignables, &mut registry)?;

        let dependencies = match &config.dependencies.path {
            Some(path) => DependencyIndex::load(path)?,
            None => DependencyIndex::empty(),
        };

        info!(
            assignables = registry.len(),
            dependency_features = dependencies.len(),
            "switchyard initialized"
        );
        Ok(Self::new(Arc::clone(&engine) as Arc<dyn IFeatureStore>, engine, registry, dependencies))
    }

    /// Open the configured database and build over it.
    pub fn open(config: &SwitchyardConfig) -> ToggleResult<Self> {
        let engine = SwitchyardStorageEngine::from_config(&config.storage)?;
        Self::from_engine(Arc::new(engine), config)
    }

    pub fn resolver(&self) -> FeatureResolver {
        FeatureResolver::new(Arc::clone(&self.features))
    }

    pub fn manager(&self) -> FeatureManager {
        FeatureManager::new(Arc::clone(&self.features))
    }

    pub fn analytics(&self) -> Analytics {
        Analytics::new(
            self.resolver(),
            Arc::clone(&self.assignments),
            Arc::clone(&self.registry),
        )
    }

    pub fn registry(&self) -> &AssignableRegistry {
        &self.registry
    }

    // ---- Dependencies ----

    /// The current index. Later reloads do not affect the returned snapshot.
    pub fn dependency_index(&self) -> Arc<DependencyIndex> {
        let guard = self.dependencies.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Swap in a new dependency index.
    pub fn reload_dependencies(&self, index: DependencyIndex) {
        info!(features = index.len(), "dependency index replaced");
        *self.dependencies.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(index);
    }

    /// Load a dependency file and swap it in. The current index is kept
    /// when loading fails.
    pub fn reload_dependencies_from(&self, path: &Path) -> ToggleResult<()> {
        let index = DependencyIndex::load(path)?;
        self.reload_dependencies(index);
        Ok(())
    }

    pub fn dependencies_for(&self, identifier: &str) -> Vec<String> {
        self.dependency_index().dependencies_for(identifier).to_vec()
    }

    pub fn dependents_of(&self, identifier: &str) -> Vec<String> {
        self.dependency_index().dependents_of(identifier).to_vec()
    }

    pub fn has_dependencies(&self, identifier: &str) -> bool {
        self.dependency_index().has_dependencies(identifier)
    }

    // ---- Features ----

    /// Features matching `identifiers` (empty = any) and `filters`.
    pub fn resolve_features<I, S>(&self, identifiers: I, filters: &FeatureQuery) -> ToggleResult<Vec<Feature>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.resolver().resolve_identifiers(identifiers, filters)
    }

    pub fn create_feature(&self, feature: NewFeature) -> ToggleResult<Feature> {
        self.manager().create(feature)
    }

    pub fn update_feature(&self, identifier: &str, update: FeatureUpdate) -> ToggleResult<Feature> {
        self.manager().update(identifier, update)
    }

    pub fn destroy_feature(&self, identifier: &str) -> ToggleResult<usize> {
        self.manager().destroy(identifier)
    }

    pub fn toggle_feature(&self, identifier: &str) -> ToggleResult<Feature> {
        self.manager().toggle(identifier)
    }

    pub fn activate_feature(&self, identifier: &str) -> ToggleResult<Feature> {
        self.manager().activate(identifier)
    }

    pub fn inactivate_feature(&self, identifier: &str) -> ToggleResult<Feature> {
        self.manager().inactivate(identifier)
    }

    pub fn feature(&self, identifier: &str) -> ToggleResult<Feature> {
        self.manager().feature(identifier)
    }

    pub fn features(&self) -> ToggleResult<Vec<Feature>> {
        self.manager().features()
    }

    // ---- Assignments ----

    /// Every assignment row stored for one assignable type.
    pub fn assignments_for_type(&self, kind: &str) -> ToggleResult<Vec<FeatureAssignment>> {
        Ok(self.assignments.assignments_for_type(kind)?)
    }

    /// Handle for one assignable. Fails when the type is not registered or
    /// the row does not exist.
    pub fn assignable(&self, target: AssignableRef) -> ToggleResult<AssignableFeatures> {
        self.registry.validate(&target)?;
        Ok(AssignableFeatures::new(
            target,
            self.resolver(),
            Arc::clone(&self.assignments),
            self.dependency_index(),
        ))
    }

    // ---- Bulk ----

    /// Bulk toggler bound to one registered assignable type.
    pub fn bulk(&self, kind: &str) -> ToggleResult<BulkToggler> {
        let source = self.registry.require(kind)?;
        Ok(BulkToggler::new(source, self.resolver(), Arc::clone(&self.assignments)))
    }

    pub fn bulk_enable<I, S>(&self, kind: &str, identifiers: I, filters: &BulkFilters) -> ToggleResult<BulkToggleReport>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bulk(kind)?.enable(identifiers, filters)
    }

    pub fn bulk_disable<I, S>(&self, kind: &str, identifiers: I, filters: &BulkFilters) -> ToggleResult<BulkToggleReport>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bulk(kind)?.disable(identifiers, filters)
    }

    // ---- Analytics ----

    pub fn track(&self, identifier: &str) -> ToggleResult<Vec<AnalyticsRecord>> {
        self.analytics().track(identifier)
    }

    pub fn track_at(&self, identifier: &str, now: DateTime<Utc>) -> ToggleResult<Vec<AnalyticsRecord>> {
        self.analytics().track_at(identifier, now)
    }
}
