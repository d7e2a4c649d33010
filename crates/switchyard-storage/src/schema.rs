//! Schema SQL, one const per migration version.

/// v1: features + feature_assignments.
///
/// Timestamps are unix seconds. `(feature_id, assignable_type, assignable_id)`
/// is unique: a feature is assigned to an assignable at most once.
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS features (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    identifier TEXT NOT NULL,
    description TEXT,
    group_name TEXT,
    environment TEXT,
    tenant_id TEXT,
    status INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
) STRICT;

CREATE UNIQUE INDEX IF NOT EXISTS idx_features_name ON features(name);
CREATE UNIQUE INDEX IF NOT EXISTS idx_features_identifier ON features(identifier);
CREATE INDEX IF NOT EXISTS idx_features_group ON features(group_name);
CREATE INDEX IF NOT EXISTS idx_features_environment ON features(environment);
CREATE INDEX IF NOT EXISTS idx_features_tenant ON features(tenant_id);
CREATE INDEX IF NOT EXISTS idx_features_status ON features(status);

CREATE TABLE IF NOT EXISTS feature_assignments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    feature_id INTEGER NOT NULL REFERENCES features(id) ON DELETE CASCADE,
    assignable_type TEXT NOT NULL,
    assignable_id INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
) STRICT;

CREATE UNIQUE INDEX IF NOT EXISTS idx_assignments_unique
    ON feature_assignments(feature_id, assignable_type, assignable_id);
CREATE INDEX IF NOT EXISTS idx_assignments_assignable
    ON feature_assignments(assignable_type, assignable_id);
CREATE INDEX IF NOT EXISTS idx_assignments_created
    ON feature_assignments(feature_id, assignable_type, created_at);
"#;
