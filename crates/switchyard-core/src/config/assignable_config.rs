//! Assignable type registration: which host table backs each assignable kind.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignableConfig {
    /// Type name stored in `feature_assignments.assignable_type`.
    pub kind: String,
    /// Host table holding the population.
    pub table: String,
    /// Integer primary key column. Default: `id`.
    #[serde(default)]
    pub id_column: Option<String>,
}

impl AssignableConfig {
    pub fn new(kind: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            table: table.into(),
            id_column: None,
        }
    }

    pub fn with_id_column(mut self, id_column: impl Into<String>) -> Self {
        self.id_column = Some(id_column.into());
        self
    }

    pub fn effective_id_column(&self) -> &str {
        self.id_column.as_deref().unwrap_or("id")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kind.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "assignables.kind".into(),
                message: "must not be blank".into(),
            });
        }
        validate_sql_identifier("assignables.table", &self.table)?;
        validate_sql_identifier("assignables.id_column", self.effective_id_column())
    }
}

/// Table and column names are interpolated into SQL, so only plain
/// identifiers (`[A-Za-z_][A-Za-z0-9_]*`) are accepted.
pub fn validate_sql_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field: field.to_string(),
            message: format!("'{value}' is not a plain SQL identifier"),
        })
    }
}
