//! Feature query filters.
//!
//! A `FeatureQuery` is a conjunction of optional filters. Filters left unset
//! do not restrict the result; blank values passed to the builder are treated
//! as unset. `role` is a synonym for `group` and `env` for `environment`.

use serde::{Deserialize, Serialize};

use super::feature::FeatureStatus;

/// Filter on one optional scope column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeFilter {
    /// Column equals the value.
    Equals(String),
    /// Column is NULL.
    Missing,
}

impl ScopeFilter {
    /// `Some(Equals)` for a non-blank value, `None` for a blank one.
    pub fn non_blank(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self::Equals(trimmed.to_string()))
        }
    }

    /// Whether a stored column value satisfies this filter.
    pub fn matches(&self, column: Option<&str>) -> bool {
        match (self, column) {
            (Self::Equals(want), Some(have)) => want == have,
            (Self::Missing, None) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureQuery {
    /// Identifier membership. Empty means no identifier restriction.
    pub identifiers: Vec<String>,
    pub group: Option<ScopeFilter>,
    pub environment: Option<ScopeFilter>,
    pub tenant_id: Option<ScopeFilter>,
    pub status: Option<FeatureStatus>,
}

impl FeatureQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a single identifier (added to any already present).
    pub fn identifier(mut self, identifier: impl AsRef<str>) -> Self {
        let id = identifier.as_ref().trim();
        if !id.is_empty() && !self.identifiers.iter().any(|i| i == id) {
            self.identifiers.push(id.to_string());
        }
        self
    }

    pub fn identifiers<I, S>(self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        identifiers.into_iter().fold(self, |q, id| q.identifier(id))
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

    pub fn status(mut self, status: FeatureStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// True when no filter restricts the result.
    pub fn is_unrestricted(&self) -> bool {
        self.identifiers.is_empty()
            && self.group.is_none()
            && self.environment.is_none()
            && self.tenant_id.is_none()
            && self.status.is_none()
    }
}
