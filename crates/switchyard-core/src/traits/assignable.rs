//! Assignable populations and the registry that maps type names to them.
//!
//! Assignment rows store the assignable's type as a plain string. The
//! registry turns that string back into query capabilities; a type with no
//! registered source is unresolvable.

use std::sync::Arc;

use crate::errors::{StorageError, ToggleError, ToggleResult};
use crate::types::collections::FxHashMap;
use crate::types::{AssignableId, AssignableRef, FeatureId};

/// Population-level queries over one assignable type.
pub trait AssignableSource: Send + Sync {
    /// Type name as stored on assignment rows.
    fn kind(&self) -> &str;

    /// Distinct members holding at least one of `feature_ids`, ascending.
    /// Empty when `feature_ids` is empty.
    fn with_features(&self, feature_ids: &[FeatureId]) -> Result<Vec<AssignableId>, StorageError>;

    /// Distinct members holding none of `feature_ids`, ascending. Every
    /// member when `feature_ids` is empty.
    fn without_features(&self, feature_ids: &[FeatureId]) -> Result<Vec<AssignableId>, StorageError>;

    /// Size of the whole population.
    fn count(&self) -> Result<i64, StorageError>;

    fn exists(&self, id: AssignableId) -> Result<bool, StorageError>;
}

impl<T: AssignableSource + ?Sized> AssignableSource for Arc<T> {
    fn kind(&self) -> &str {
        (**self).kind()
    }
    fn with_features(&self, feature_ids: &[FeatureId]) -> Result<Vec<AssignableId>, StorageError> {
        (**self).with_features(feature_ids)
    }
    fn without_features(&self, feature_ids: &[FeatureId]) -> Result<Vec<AssignableId>, StorageError> {
        (**self).without_features(feature_ids)
    }
    fn count(&self) -> Result<i64, StorageError> {
        (**self).count()
    }
    fn exists(&self, id: AssignableId) -> Result<bool, StorageError> {
        (**self).exists(id)
    }
}

/// Type name → population source. Populated at startup.
#[derive(Default, Clone)]
pub struct AssignableRegistry {
    sources: FxHashMap<String, Arc<dyn AssignableSource>>,
}

impl AssignableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under its own kind, replacing any previous one.
    pub fn register(&mut self, source: Arc<dyn AssignableSource>) {
        self.sources.insert(source.kind().to_string(), source);
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn AssignableSource>> {
        self.sources.get(kind).cloned()
    }

    /// Like [`get`](Self::get), failing with `UnknownAssignableType`.
    pub fn require(&self, kind: &str) -> ToggleResult<Arc<dyn AssignableSource>> {
        self.get(kind).ok_or_else(|| ToggleError::UnknownAssignableType {
            kind: kind.to_string(),
        })
    }

    /// Check that `assignable` names a registered type and an existing row.
    pub fn validate(&self, assignable: &AssignableRef) -> ToggleResult<()> {
        let source = self.require(&assignable.kind)?;
        if source.exists(assignable.id)? {
            Ok(())
        } else {
            Err(StorageError::NotFound {
                entity: assignable.kind.clone(),
                key: assignable.id.to_string(),
            }
            .into())
        }
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.sources.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl std::fmt::Debug for AssignableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignableRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPopulation {
        kind: &'static str,
        members: Vec<AssignableId>,
    }

    impl AssignableSource for FixedPopulation {
        fn kind(&self) -> &str {
            self.kind
        }
        fn with_features(&self, _: &[FeatureId]) -> Result<Vec<AssignableId>, StorageError> {
            Ok(Vec::new())
        }
        fn without_features(&self, _: &[FeatureId]) -> Result<Vec<AssignableId>, StorageError> {
            Ok(self.members.clone())
        }
        fn count(&self) -> Result<i64, StorageError> {
            Ok(self.members.len() as i64)
        }
        fn exists(&self, id: AssignableId) -> Result<bool, StorageError> {
            Ok(self.members.contains(&id))
        }
    }

    fn registry() -> AssignableRegistry {
        let mut registry = AssignableRegistry::new();
        registry.register(Arc::new(FixedPopulation { kind: "User", members: vec![1, 2] }));
        registry.register(Arc::new(FixedPopulation { kind: "Account", members: vec![9] }));
        registry
    }

    #[test]
    fn resolves_registered_kinds() {
        let registry = registry();
        assert_eq!(registry.kinds(), ["Account", "User"]);
        assert_eq!(registry.require("User").unwrap().count().unwrap(), 2);
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let err = registry().require("Ghost").err().unwrap();
        assert!(matches!(err, ToggleError::UnknownAssignableType { kind } if kind == "Ghost"));
    }

    #[test]
    fn validate_checks_row_existence() {
        let registry = registry();
        registry.validate(&AssignableRef::new("User", 2)).unwrap();
        assert!(matches!(
            registry.validate(&AssignableRef::new("User", 3)),
            Err(ToggleError::Storage(StorageError::NotFound { .. }))
        ));
    }
}
