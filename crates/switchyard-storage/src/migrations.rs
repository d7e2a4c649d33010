//! Schema versioning using PRAGMA user_version.
//!
//! Forward-only. Each version is a const SQL string applied in its own
//! IMMEDIATE transaction together with the version bump.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use switchyard_core::errors::StorageError;
use tracing::{debug, info};

use crate::schema::SCHEMA_V1;

/// Current schema version. Bump this when adding new migrations.
pub const CURRENT_VERSION: u32 = 1;

const MIGRATIONS: [(u32, &str); 1] = [(1, SCHEMA_V1)];

pub fn get_schema_version(conn: &Connection) -> Result<u32, StorageError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

/// Bring the database up to `CURRENT_VERSION`.
///
/// Returns the version the database ends at. A database written by a newer
/// release is rejected rather than downgraded.
pub fn migrate(conn: &Connection) -> Result<u32, StorageError> {
    let current = get_schema_version(conn)?;
    if current > CURRENT_VERSION {
        return Err(StorageError::MigrationFailed {
            version: current,
            message: format!("database is newer than supported version {CURRENT_VERSION}"),
        });
    }
    if current == CURRENT_VERSION {
        debug!(version = current, "schema is up to date");
        return Ok(current);
    }

    info!(from = current, to = CURRENT_VERSION, "running schema migrations");
    for &(version, sql) in &MIGRATIONS {
        if version <= current {
            continue;
        }
        let fail = |e: rusqlite::Error| StorageError::MigrationFailed {
            version,
            message: e.to_string(),
        };
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(fail)?;
        tx.execute_batch(sql).map_err(fail)?;
        tx.pragma_update(None, "user_version", version).map_err(fail)?;
        tx.commit().map_err(fail)?;
        debug!(version, "applied migration");
    }
    Ok(CURRENT_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_db() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn fresh_db_migrates_to_current() {
        let conn = fresh_db();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
        assert_eq!(migrate(&conn).unwrap(), CURRENT_VERSION);
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('features', 'feature_assignments')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = fresh_db();
        migrate(&conn).unwrap();
        assert_eq!(migrate(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn newer_database_is_rejected() {
        let conn = fresh_db();
        conn.pragma_update(None, "user_version", CURRENT_VERSION + 1).unwrap();
        assert!(matches!(
            migrate(&conn),
            Err(StorageError::MigrationFailed { .. })
        ));
    }
}
