//! Feature assignments and the row-level diff used by bulk writes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::collections::FxHashSet;
use super::identifiers::{AssignableId, AssignableRef, FeatureId};

/// A stored assignment: "this assignable currently has this feature".
/// Never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureAssignment {
    pub id: i64,
    pub feature_id: FeatureId,
    pub assignable_type: String,
    pub assignable_id: AssignableId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeatureAssignment {
    pub fn assignable(&self) -> AssignableRef {
        AssignableRef::new(self.assignable_type.clone(), self.assignable_id)
    }

    pub fn key(&self) -> AssignmentKey {
        AssignmentKey::new(self.assignable_id, self.feature_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleDirection {
    Enable,
    Disable,
}

impl ToggleDirection {
    pub fn name(self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }
}

impl fmt::Display for ToggleDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An (assignable, feature) pair within a single assignable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssignmentKey {
    pub assignable_id: AssignableId,
    pub feature_id: FeatureId,
}

impl AssignmentKey {
    pub fn new(assignable_id: AssignableId, feature_id: FeatureId) -> Self {
        Self {
            assignable_id,
            feature_id,
        }
    }
}

/// One bulk write request: apply `direction` for every feature in
/// `feature_ids` to every assignable in `assignable_ids` of type `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentBatch {
    pub kind: String,
    pub direction: ToggleDirection,
    pub assignable_ids: Vec<AssignableId>,
    pub feature_ids: Vec<FeatureId>,
}

impl AssignmentBatch {
    pub fn new(
        kind: impl Into<String>,
        direction: ToggleDirection,
        assignable_ids: Vec<AssignableId>,
        feature_ids: Vec<FeatureId>,
    ) -> Self {
        Self {
            kind: kind.into(),
            direction,
            assignable_ids,
            feature_ids,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assignable_ids.is_empty() || self.feature_ids.is_empty()
    }

    /// Compute the exact row diff against the pairs that already exist.
    ///
    /// Enable yields every pair not in `existing`; disable yields every pair
    /// that is. Duplicate ids in the batch produce each key once.
    pub fn plan(&self, existing: &FxHashSet<AssignmentKey>) -> AssignmentPlan {
        let mut seen = FxHashSet::default();
        let mut keys = Vec::new();
        let mut already_satisfied = 0usize;

        for &assignable_id in &self.assignable_ids {
            for &feature_id in &self.feature_ids {
                let key = AssignmentKey::new(assignable_id, feature_id);
                if !seen.insert(key) {
                    continue;
                }
                let present = existing.contains(&key);
                match (self.direction, present) {
                    (ToggleDirection::Enable, false) | (ToggleDirection::Disable, true) => {
                        keys.push(key)
                    }
                    _ => already_satisfied += 1,
                }
            }
        }

        match self.direction {
            ToggleDirection::Enable => AssignmentPlan {
                inserts: keys,
                deletes: Vec::new(),
                already_satisfied,
            },
            ToggleDirection::Disable => AssignmentPlan {
                inserts: Vec::new(),
                deletes: keys,
                already_satisfied,
            },
        }
    }
}

/// Rows a batch will write after diffing against existing assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentPlan {
    pub inserts: Vec<AssignmentKey>,
    pub deletes: Vec<AssignmentKey>,
    /// Pairs that needed no write.
    pub already_satisfied: usize,
}

impl AssignmentPlan {
    pub fn is_noop(&self) -> bool {
        self.inserts.is_empty() && self.deletes.is_empty()
    }
}

/// Outcome of applying an [`AssignmentBatch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkWriteStats {
    pub inserted: usize,
    pub deleted: usize,
    /// Pairs already in the target state, plus inserts ignored because a
    /// concurrent writer created the row first.
    pub skipped: usize,
}
