//! Identifier types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Surrogate key of a feature row.
pub type FeatureId = i64;

/// Primary key of an assignable row in its host table.
pub type AssignableId = i64;

/// A polymorphic reference to one assignable: its type name plus primary key.
///
/// `kind` is the exact string stored in `feature_assignments.assignable_type`
/// and must be registered with the assignable registry before use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssignableRef {
    pub kind: String,
    pub id: AssignableId,
}

impl AssignableRef {
    pub fn new(kind: impl Into<String>, id: AssignableId) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }
}

impl fmt::Display for AssignableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}
