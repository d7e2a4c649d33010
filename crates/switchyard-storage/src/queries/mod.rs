//! SQL query modules, one per table, plus shared helpers.

pub mod assignables;
pub mod assignments;
pub mod features;

use chrono::{DateTime, Utc};
use rusqlite::ffi;
use switchyard_core::errors::StorageError;

/// Maximum number of ids bound into a single `IN (...)` list.
pub(crate) const IN_CHUNK: usize = 500;

/// Map a rusqlite error, keeping lock contention distinguishable.
pub(crate) fn sqe(e: rusqlite::Error) -> StorageError {
    match &e {
        rusqlite::Error::SqliteFailure(
            ffi::Error {
                code: ffi::ErrorCode::DatabaseBusy | ffi::ErrorCode::DatabaseLocked,
                ..
            },
            _,
        ) => StorageError::DbBusy,
        _ => StorageError::SqliteError { message: e.to_string() },
    }
}

/// Like [`sqe`], but turns a UNIQUE failure into `UniqueViolation`.
/// `value_of` maps the failing column name to the offending value.
pub(crate) fn sqe_unique(e: rusqlite::Error, value_of: impl Fn(&str) -> String) -> StorageError {
    if let rusqlite::Error::SqliteFailure(err, Some(message)) = &e {
        if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE {
            // "UNIQUE constraint failed: features.identifier"
            let target = message.rsplit(": ").next().unwrap_or_default();
            let (table, column) = target.split_once('.').unwrap_or(("", target));
            return StorageError::UniqueViolation {
                table: table.to_string(),
                column: column.to_string(),
                value: value_of(column),
            };
        }
    }
    sqe(e)
}

/// `?,?,?` with `n` placeholders.
pub(crate) fn placeholders(n: usize) -> String {
    let mut out = String::with_capacity(n * 2);
    for i in 0..n {
        if i > 0 {
            out.push(',');
        }
        out.push('?');
    }
    out
}

pub(crate) fn to_unix(ts: DateTime<Utc>) -> i64 {
    ts.timestamp()
}

pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
