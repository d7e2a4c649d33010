//! Feature resolution: identifiers plus scope filters → feature records.
//!
//! An empty match is not an error here. Callers that need at least one
//! feature raise `FeatureNotFound` themselves.

use std::sync::Arc;

use switchyard_core::errors::{ToggleError, ToggleResult};
use switchyard_core::traits::IFeatureStore;
use switchyard_core::types::{Feature, FeatureId, FeatureQuery};

/// A feature named by identifier, or a record the caller already holds.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureRef {
    Identifier(String),
    Record(Feature),
}

impl From<&str> for FeatureRef {
    fn from(identifier: &str) -> Self {
        Self::Identifier(identifier.to_string())
    }
}

impl From<String> for FeatureRef {
    fn from(identifier: String) -> Self {
        Self::Identifier(identifier)
    }
}

impl From<&String> for FeatureRef {
    fn from(identifier: &String) -> Self {
        Self::Identifier(identifier.clone())
    }
}

impl From<Feature> for FeatureRef {
    fn from(feature: Feature) -> Self {
        Self::Record(feature)
    }
}

impl From<&Feature> for FeatureRef {
    fn from(feature: &Feature) -> Self {
        Self::Record(feature.clone())
    }
}

#[derive(Clone)]
pub struct FeatureResolver {
    store: Arc<dyn IFeatureStore>,
}

impl FeatureResolver {
    pub fn new(store: Arc<dyn IFeatureStore>) -> Self {
        Self { store }
    }

    /// Every feature matching `query`. May be empty.
    pub fn resolve(&self, query: &FeatureQuery) -> ToggleResult<Vec<Feature>> {
        Ok(self.store.query_features(query)?)
    }

    /// Features whose identifier is in `identifiers` and that satisfy every
    /// filter in `filters`. May be empty.
    pub fn resolve_identifiers<I, S>(&self, identifiers: I, filters: &FeatureQuery) -> ToggleResult<Vec<Feature>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let query = filters.clone().identifiers(identifiers);
        self.resolve(&query)
    }

    pub fn get(&self, id: FeatureId) -> ToggleResult<Option<Feature>> {
        Ok(self.store.get_feature(id)?)
    }

    pub fn find(&self, identifier: &str) -> ToggleResult<Option<Feature>> {
        Ok(self.store.find_feature(identifier)?)
    }

    /// The feature with this identifier, or `FeatureNotFound`.
    pub fn require(&self, identifier: &str) -> ToggleResult<Feature> {
        self.find(identifier)?
            .ok_or_else(|| ToggleError::feature_not_found(format!("identifier '{identifier}'")))
    }

    /// Resolve a reference. Records pass through unchanged.
    pub fn require_ref(&self, feature: FeatureRef) -> ToggleResult<Feature> {
        match feature {
            FeatureRef::Identifier(identifier) => self.require(&identifier),
            FeatureRef::Record(feature) => Ok(feature),
        }
    }

    pub fn all(&self) -> ToggleResult<Vec<Feature>> {
        self.resolve(&FeatureQuery::new())
    }
}
