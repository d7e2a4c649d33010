//! Bulk toggling across an assignable population.
//!
//! resolve features → partition the population → optionally sample →
//! diff against existing assignments → write, all-or-nothing.

use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use switchyard_core::errors::{ToggleError, ToggleResult};
use switchyard_core::traits::{AssignableSource, IAssignmentStore};
use switchyard_core::types::{
    AssignableId, AssignmentBatch, FeatureId, FeatureQuery, ScopeFilter, ToggleDirection,
};
use tracing::info;

use crate::resolver::FeatureResolver;

/// Scope and sampling filters for a bulk toggle.
///
/// `group`/`role` and `environment`/`env` are synonyms. Blank values are
/// ignored. `percentage` only affects sampling, never feature resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkFilters {
    pub group: Option<ScopeFilter>,
    pub environment: Option<ScopeFilter>,
    pub tenant_id: Option<ScopeFilter>,
    pub percentage: Option<f64>,
}

impl BulkFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, group: impl AsRef<str>) -> Self {
        if let Some(filter) = ScopeFilter::non_blank(group.as_ref()) {
            self.group = Some(filter);
        }
        self
    }

    pub fn role(self, role: impl AsRef<str>) -> Self {
        self.group(role)
    }

    pub fn without_group(mut self) -> Self {
        self.group = Some(ScopeFilter::Missing);
        self
    }

    pub fn environment(mut self, environment: impl AsRef<str>) -> Self {
        if let Some(filter) = ScopeFilter::non_blank(environment.as_ref()) {
            self.environment = Some(filter);
        }
        self
    }

    pub fn env(self, env: impl AsRef<str>) -> Self {
        self.environment(env)
    }

    pub fn without_environment(mut self) -> Self {
        self.environment = Some(ScopeFilter::Missing);
        self
    }

    pub fn tenant_id(mut self, tenant_id: impl AsRef<str>) -> Self {
        if let Some(filter) = ScopeFilter::non_blank(tenant_id.as_ref()) {
            self.tenant_id = Some(filter);
        }
        self
    }

    pub fn without_tenant(mut self) -> Self {
        self.tenant_id = Some(ScopeFilter::Missing);
        self
    }

    pub fn percentage(mut self, percentage: f64) -> Self {
        self.percentage = Some(percentage);
        self
    }

    /// The feature query for `identifiers` under these scope filters.
    pub fn feature_query(&self, identifiers: &[String]) -> FeatureQuery {
        FeatureQuery {
            group: self.group.clone(),
            environment: self.environment.clone(),
            tenant_id: self.tenant_id.clone(),
            ..FeatureQuery::default()
        }
        .identifiers(identifiers)
    }
}

/// Outcome of a successful bulk toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkToggleReport {
    pub kind: String,
    pub direction: ToggleDirection,
    pub feature_ids: Vec<FeatureId>,
    /// Population members eligible before sampling.
    pub candidates: usize,
    /// Members the write was applied to.
    pub sampled: usize,
    pub inserted: usize,
    pub deleted: usize,
    pub skipped: usize,
}

/// Reject anything but a finite value in `0..=100`.
pub fn validate_percentage(percentage: f64) -> ToggleResult<f64> {
    if percentage.is_finite() && (0.0..=100.0).contains(&percentage) {
        Ok(percentage)
    } else {
        Err(ToggleError::InvalidPercentage { value: percentage })
    }
}

/// `round(len * percentage / 100)`, halves rounding away from zero.
pub fn sample_size(len: usize, percentage: f64) -> usize {
    let size = (len as f64 * percentage / 100.0).round();
    (size.max(0.0) as usize).min(len)
}

/// Uniform sample without replacement, returned in ascending order.
pub fn sample<R: Rng + ?Sized>(candidates: &[AssignableId], percentage: f64, rng: &mut R) -> Vec<AssignableId> {
    let amount = sample_size(candidates.len(), percentage);
    let mut picked: Vec<AssignableId> = candidates.choose_multiple(rng, amount).copied().collect();
    picked.sort_unstable();
    picked
}

/// Bulk enable/disable for one assignable type.
pub struct BulkToggler {
    source: Arc<dyn AssignableSource>,
    resolver: FeatureResolver,
    assignments: Arc<dyn IAssignmentStore>,
}

impl BulkToggler {
    pub fn new(
        source: Arc<dyn AssignableSource>,
        resolver: FeatureResolver,
        assignments: Arc<dyn IAssignmentStore>,
    ) -> Self {
        Self {
            source,
            resolver,
            assignments,
        }
    }

    pub fn kind(&self) -> &str {
        self.source.kind()
    }

    pub fn enable<I, S>(&self, identifiers: I, filters: &BulkFilters) -> ToggleResult<BulkToggleReport>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.toggle(ToggleDirection::Enable, collect_identifiers(identifiers), filters)
    }

    pub fn disable<I, S>(&self, identifiers: I, filters: &BulkFilters) -> ToggleResult<BulkToggleReport>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.toggle(ToggleDirection::Disable, collect_identifiers(identifiers), filters)
    }

    pub fn toggle(
        &self,
        direction: ToggleDirection,
        identifiers: Vec<String>,
        filters: &BulkFilters,
    ) -> ToggleResult<BulkToggleReport> {
        self.toggle_with_rng(direction, identifiers, filters, &mut rand::thread_rng())
    }

    /// [`toggle`](Self::toggle) with a caller-supplied sampling source.
    pub fn toggle_with_rng<R: Rng + ?Sized>(
        &self,
        direction: ToggleDirection,
        identifiers: Vec<String>,
        filters: &BulkFilters,
        rng: &mut R,
    ) -> ToggleResult<BulkToggleReport> {
        let percentage = filters.percentage.map(validate_percentage).transpose()?;
        let kind = self.source.kind().to_string();

        let features = self.resolver.resolve(&filters.feature_query(&identifiers))?;
        if features.is_empty() {
            return Err(ToggleError::feature_not_found(format!(
                "identifiers {identifiers:?} with the given filters"
            )));
        }
        let feature_ids: Vec<FeatureId> = features.iter().map(|f| f.id).collect();

        let candidates = match direction {
            ToggleDirection::Enable => self.source.without_features(&feature_ids)?,
            ToggleDirection::Disable => self.source.with_features(&feature_ids)?,
        };
        if candidates.is_empty() {
            return Err(ToggleError::AssignablesNotFound { kind });
        }

        let candidate_count = candidates.len();
        let targets = match percentage {
            Some(p) => sample(&candidates, p, rng),
            None => candidates,
        };
        let sampled = targets.len();

        let batch = AssignmentBatch::new(kind.clone(), direction, targets, feature_ids.clone());
        let stats = self
            .assignments
            .apply_batch(&batch, Utc::now())
            .map_err(|source| ToggleError::BulkToggleFailed {
                message: format!(
                    "Bulk toggle {direction} failed for {kind} with identifiers {identifiers:?}"
                ),
                source,
            })?;

        info!(
            kind = %kind,
            direction = %direction,
            identifiers = ?identifiers,
            candidates = candidate_count,
            sampled,
            inserted = stats.inserted,
            deleted = stats.deleted,
            skipped = stats.skipped,
            "bulk toggle applied"
        );

        Ok(BulkToggleReport {
            kind,
            direction,
            feature_ids,
            candidates: candidate_count,
            sampled,
            inserted: stats.inserted,
            deleted: stats.deleted,
            skipped: stats.skipped,
        })
    }
}

fn collect_identifiers<I, S>(identifiers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    identifiers.into_iter().map(Into::into).collect()
}
