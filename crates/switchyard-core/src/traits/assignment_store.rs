//! `IAssignmentStore` trait: the feature_assignments table.
//!
//! Maps to `switchyard-storage/src/queries/assignments.rs`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::types::{AssignableRef, AssignmentBatch, BulkWriteStats, FeatureAssignment, FeatureId};

/// Creation-count windows reported by [`AssignmentActivity`], in days.
pub const ACTIVITY_WINDOWS_DAYS: [i64; 3] = [7, 14, 30];

/// Creation-time statistics for one feature within one assignable type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentActivity {
    pub count: i64,
    pub first_created: Option<DateTime<Utc>>,
    pub last_created: Option<DateTime<Utc>>,
    pub past_7_days: i64,
    pub past_14_days: i64,
    pub past_30_days: i64,
}

pub trait IAssignmentStore: Send + Sync {
    /// Diff `batch` against existing rows and write the difference.
    ///
    /// The existence read and the write run in one transaction: either every
    /// planned row is written or none is. Inserts that collide with a row
    /// created concurrently are counted as skipped.
    fn apply_batch(&self, batch: &AssignmentBatch, now: DateTime<Utc>) -> Result<BulkWriteStats, StorageError>;

    /// Assign one feature. Returns `false` when already assigned.
    fn assign(&self, assignable: &AssignableRef, feature_id: FeatureId, now: DateTime<Utc>) -> Result<bool, StorageError>;

    /// Remove one assignment. Returns `false` when it did not exist.
    fn unassign(&self, assignable: &AssignableRef, feature_id: FeatureId) -> Result<bool, StorageError>;

    /// Remove every assignment of one assignable.
    fn clear_assignments(&self, assignable: &AssignableRef) -> Result<usize, StorageError>;

    /// Whether the assignable holds at least one of `feature_ids`.
    fn has_assignment(&self, assignable: &AssignableRef, feature_ids: &[FeatureId]) -> Result<bool, StorageError>;

    fn assigned_feature_ids(&self, assignable: &AssignableRef) -> Result<Vec<FeatureId>, StorageError>;

    fn assignments_for_feature(&self, feature_id: FeatureId) -> Result<Vec<FeatureAssignment>, StorageError>;

    fn assignments_for_type(&self, kind: &str) -> Result<Vec<FeatureAssignment>, StorageError>;

    /// Distinct assignable types holding the feature, sorted.
    fn assignable_types_for_feature(&self, feature_id: FeatureId) -> Result<Vec<String>, StorageError>;

    /// Creation statistics relative to `now`.
    fn activity_for(
        &self,
        feature_id: FeatureId,
        kind: &str,
        now: DateTime<Utc>,
    ) -> Result<AssignmentActivity, StorageError>;

    fn count_assignments(&self) -> Result<i64, StorageError>;
}

impl<T: IAssignmentStore + ?Sized> IAssignmentStore for Arc<T> {
    fn apply_batch(&self, batch: &AssignmentBatch, now: DateTime<Utc>) -> Result<BulkWriteStats, StorageError> {
        (**self).apply_batch(batch, now)
    }
    fn assign(&self, assignable: &AssignableRef, feature_id: FeatureId, now: DateTime<Utc>) -> Result<bool, StorageError> {
        (**self).assign(assignable, feature_id, now)
    }
    fn unassign(&self, assignable: &AssignableRef, feature_id: FeatureId) -> Result<bool, StorageError> {
        (**self).unassign(assignable, feature_id)
    }
    fn clear_assignments(&self, assignable: &AssignableRef) -> Result<usize, StorageError> {
        (**self).clear_assignments(assignable)
    }
    fn has_assignment(&self, assignable: &AssignableRef, feature_ids: &[FeatureId]) -> Result<bool, StorageError> {
        (**self).has_assignment(assignable, feature_ids)
    }
    fn assigned_feature_ids(&self, assignable: &AssignableRef) -> Result<Vec<FeatureId>, StorageError> {
        (**self).assigned_feature_ids(assignable)
    }
    fn assignments_for_feature(&self, feature_id: FeatureId) -> Result<Vec<FeatureAssignment>, StorageError> {
        (**self).assignments_for_feature(feature_id)
    }
    fn assignments_for_type(&self, kind: &str) -> Result<Vec<FeatureAssignment>, StorageError> {
        (**self).assignments_for_type(kind)
    }
    fn assignable_types_for_feature(&self, feature_id: FeatureId) -> Result<Vec<String>, StorageError> {
        (**self).assignable_types_for_feature(feature_id)
    }
    fn activity_for(
        &self,
        feature_id: FeatureId,
        kind: &str,
        now: DateTime<Utc>,
    ) -> Result<AssignmentActivity, StorageError> {
        (**self).activity_for(feature_id, kind, now)
    }
    fn count_assignments(&self) -> Result<i64, StorageError> {
        (**self).count_assignments()
    }
}
