//! SQLite PRAGMA configuration.
//! Must be called on every connection immediately after opening.

use rusqlite::Connection;
use switchyard_core::errors::StorageError;

use crate::queries::sqe;

/// Configure a read-write connection.
///
/// - WAL for concurrent readers during writes
/// - busy_timeout as the lock-contention mechanism between writers
/// - foreign_keys so assignments cascade with their feature
pub fn configure_connection(conn: &Connection, busy_timeout_ms: u32) -> Result<(), StorageError> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA cache_size = -8000;
        PRAGMA temp_store = MEMORY;
        "
    ))
    .map_err(sqe)
}

/// Same PRAGMAs as `configure_connection` plus `query_only = ON`.
pub fn configure_readonly_connection(conn: &Connection, busy_timeout_ms: u32) -> Result<(), StorageError> {
    configure_connection(conn, busy_timeout_ms)?;
    conn.execute_batch("PRAGMA query_only = ON;").map_err(sqe)
}
