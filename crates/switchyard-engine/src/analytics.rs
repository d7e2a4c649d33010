//! Per-feature adoption statistics, one record per assignable type.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use switchyard_core::errors::ToggleResult;
use switchyard_core::traits::{AssignableRegistry, IAssignmentStore};
use switchyard_core::types::Feature;
use tracing::{debug, warn};

use crate::resolver::FeatureResolver;

/// Adoption of one feature within one assignable type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    /// Assignable type name.
    pub assignable: String,
    /// Feature identifier.
    pub feature: String,
    pub enabled_count: usize,
    pub disabled_count: usize,
    pub total_count: usize,
    pub percentage_enabled: String,
    pub percentage_disabled: String,
    pub first_created: Option<DateTime<Utc>>,
    pub last_created: Option<DateTime<Utc>>,
    pub past_7_days: i64,
    pub past_14_days: i64,
    pub past_30_days: i64,
}

/// `count / total` as a percentage rounded to two places, e.g. `"40.0%"`
/// or `"66.67%"`. `"0.00%"` when `total` is zero.
pub fn format_percentage(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.00%".to_string();
    }
    let pct = ((count as f64 / total as f64) * 100.0 * 100.0).round() / 100.0;
    format!("{pct:?}%")
}

pub struct Analytics {
    resolver: FeatureResolver,
    assignments: Arc<dyn IAssignmentStore>,
    registry: Arc<AssignableRegistry>,
}

impl Analytics {
    pub fn new(
        resolver: FeatureResolver,
        assignments: Arc<dyn IAssignmentStore>,
        registry: Arc<AssignableRegistry>,
    ) -> Self {
        Self {
            resolver,
            assignments,
            registry,
        }
    }

    pub fn track(&self, identifier: &str) -> ToggleResult<Vec<AnalyticsRecord>> {
        self.track_at(identifier, Utc::now())
    }

    /// Records for every assignable type that holds the feature, sorted by
    /// type name. Unknown identifiers yield an empty list.
    ///
    /// A type without a registered source is logged and left out. Storage
    /// failures for a registered type abort the report.
    pub fn track_at(&self, identifier: &str, now: DateTime<Utc>) -> ToggleResult<Vec<AnalyticsRecord>> {
        let Some(feature) = self.resolver.find(identifier)? else {
            debug!(identifier, "analytics requested for unknown feature");
            return Ok(Vec::new());
        };

        let kinds = self.assignments.assignable_types_for_feature(feature.id)?;
        let mut records = Vec::with_capacity(kinds.len());
        for kind in kinds {
            match self.record_for(&feature, &kind, now)? {
                Some(record) => records.push(record),
                None => warn!(
                    kind = %kind,
                    feature = %feature.identifier,
                    "skipping unregistered assignable type"
                ),
            }
        }
        Ok(records)
    }

    fn record_for(
        &self,
        feature: &Feature,
        kind: &str,
        now: DateTime<Utc>,
    ) -> ToggleResult<Option<AnalyticsRecord>> {
        let Some(source) = self.registry.get(kind) else {
            return Ok(None);
        };
        let ids = [feature.id];
        let enabled = source.with_features(&ids)?.len();
        let disabled = source.without_features(&ids)?.len();
        let total = enabled + disabled;
        let activity = self.assignments.activity_for(feature.id, kind, now)?;

        Ok(Some(AnalyticsRecord {
            assignable: kind.to_string(),
            feature: feature.identifier.clone(),
            enabled_count: enabled,
            disabled_count: disabled,
            total_count: total,
            percentage_enabled: format_percentage(enabled, total),
            percentage_disabled: format_percentage(disabled, total),
            first_created: activity.first_created,
            last_created: activity.last_created,
            past_7_days: activity.past_7_days,
            past_14_days: activity.past_14_days,
            past_30_days: activity.past_30_days,
        }))
    }
}
