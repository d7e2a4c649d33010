//! Feature records, creation input and identifier derivation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::FeatureId;
use crate::errors::{ToggleError, ToggleResult};

/// Lifecycle status of a feature. Stored as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureStatus {
    #[default]
    Inactive,
    Active,
}

impl FeatureStatus {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Inactive => 0,
            Self::Active => 1,
        }
    }

    /// Decode a stored status. Unknown values read as `Inactive`.
    pub fn from_i64(value: i64) -> Self {
        if value == 1 {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Inactive => Self::Active,
            Self::Active => Self::Inactive,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
        }
    }
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for FeatureStatus {
    type Err = ToggleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "1" => Ok(Self::Active),
            "inactive" | "0" => Ok(Self::Inactive),
            other => Err(ToggleError::InvalidInput(format!(
                "unknown feature status '{other}'"
            ))),
        }
    }
}

/// A stored feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub name: String,
    pub identifier: String,
    pub description: Option<String>,
    pub group: Option<String>,
    pub environment: Option<String>,
    pub tenant_id: Option<String>,
    pub status: FeatureStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feature {
    pub fn is_active(&self) -> bool {
        self.status == FeatureStatus::Active
    }
}

/// Input for creating a feature.
///
/// The identifier is derived from the name when not supplied. A supplied
/// identifier is stored as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewFeature {
    pub name: String,
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub group: Option<String>,
    pub environment: Option<String>,
    pub tenant_id: Option<String>,
    pub status: FeatureStatus,
}

impl NewFeature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn status(mut self, status: FeatureStatus) -> Self {
        self.status = status;
        self
    }

    pub fn active(self) -> Self {
        self.status(FeatureStatus::Active)
    }

    /// The identifier that will be stored: the supplied one, or one derived
    /// from the name.
    pub fn resolved_identifier(&self) -> String {
        match self.identifier.as_deref() {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => derive_identifier(&self.name),
        }
    }

    /// Name and resolved identifier must both be non-blank.
    pub fn validate(&self) -> ToggleResult<()> {
        if self.name.trim().is_empty() {
            return Err(ToggleError::InvalidInput("feature name must not be blank".into()));
        }
        if self.resolved_identifier().is_empty() {
            return Err(ToggleError::InvalidInput(format!(
                "cannot derive an identifier from name '{}'",
                self.name
            )));
        }
        Ok(())
    }
}

/// Partial update of a feature's attributes. `None` leaves a field unchanged;
/// `Some(None)` clears an optional column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub group: Option<Option<String>>,
    pub environment: Option<Option<String>>,
    pub tenant_id: Option<Option<String>>,
    pub status: Option<FeatureStatus>,
}

impl FeatureUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply this update to a copy of `feature`.
    pub fn apply_to(&self, feature: &Feature) -> Feature {
        let mut next = feature.clone();
        if let Some(name) = &self.name {
            next.name = name.clone();
        }
        if let Some(description) = &self.description {
            next.description = description.clone();
        }
        if let Some(group) = &self.group {
            next.group = group.clone();
        }
        if let Some(environment) = &self.environment {
            next.environment = environment.clone();
        }
        if let Some(tenant_id) = &self.tenant_id {
            next.tenant_id = tenant_id.clone();
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        next
    }
}

/// Derive a machine identifier from a human name.
///
/// CamelCase boundaries become underscores, everything is lower-cased, and
/// each run of non-alphanumeric characters collapses to a single `_`.
/// Leading and trailing separators are dropped.
pub fn derive_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_lower_or_digit = false;
    let mut pending_sep = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if c.is_uppercase() && prev_lower_or_digit {
                pending_sep = true;
            }
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
            prev_lower_or_digit = c.is_lowercase() || c.is_numeric();
        } else {
            pending_sep = true;
            prev_lower_or_digit = false;
        }
    }
    out
}
