//! feature_assignments table queries, including the transactional bulk diff.

use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use switchyard_core::errors::StorageError;
use switchyard_core::traits::AssignmentActivity;
use switchyard_core::types::collections::FxHashSet;
use switchyard_core::types::{
    AssignableId, AssignmentBatch, AssignmentKey, BulkWriteStats, FeatureAssignment, FeatureId,
};
use tracing::debug;

use super::{from_unix, placeholders, sqe, to_unix, IN_CHUNK};

const ASSIGNMENT_COLUMNS: &str =
    "id, feature_id, assignable_type, assignable_id, created_at, updated_at";

/// Rows per multi-row INSERT (5 bound values each).
const INSERT_CHUNK: usize = 150;
/// Keys per multi-row DELETE (2 bound values each).
const DELETE_CHUNK: usize = 400;

fn row_to_assignment(row: &Row<'_>) -> rusqlite::Result<FeatureAssignment> {
    Ok(FeatureAssignment {
        id: row.get(0)?,
        feature_id: row.get(1)?,
        assignable_type: row.get(2)?,
        assignable_id: row.get(3)?,
        created_at: from_unix(row.get(4)?),
        updated_at: from_unix(row.get(5)?),
    })
}

fn collect_assignments(
    conn: &Connection,
    sql: &str,
    values: &[Value],
) -> Result<Vec<FeatureAssignment>, StorageError> {
    let mut stmt = conn.prepare_cached(sql).map_err(sqe)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), row_to_assignment)
        .map_err(sqe)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sqe)
}

/// Existing pairs of type `kind` among `assignable_ids` × `feature_ids`.
/// One query per chunk of assignable ids.
pub fn existing_pairs(
    conn: &Connection,
    kind: &str,
    assignable_ids: &[AssignableId],
    feature_ids: &[FeatureId],
) -> Result<FxHashSet<AssignmentKey>, StorageError> {
    let mut found = FxHashSet::default();
    if assignable_ids.is_empty() || feature_ids.is_empty() {
        return Ok(found);
    }

    for chunk in assignable_ids.chunks(IN_CHUNK) {
        let sql = format!(
            "SELECT assignable_id, feature_id FROM feature_assignments
             WHERE assignable_type = ? AND feature_id IN ({}) AND assignable_id IN ({})",
            placeholders(feature_ids.len()),
            placeholders(chunk.len()),
        );
        let mut values = Vec::with_capacity(1 + feature_ids.len() + chunk.len());
        values.push(Value::Text(kind.to_string()));
        values.extend(feature_ids.iter().map(|&id| Value::Integer(id)));
        values.extend(chunk.iter().map(|&id| Value::Integer(id)));

        let mut stmt = conn.prepare(&sql).map_err(sqe)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(AssignmentKey::new(row.get(0)?, row.get(1)?))
            })
            .map_err(sqe)?;
        for key in rows {
            found.insert(key.map_err(sqe)?);
        }
    }
    Ok(found)
}

/// Insert new rows, ignoring any that already exist. Returns how many were
/// actually inserted.
pub fn insert_keys(
    conn: &Connection,
    kind: &str,
    keys: &[AssignmentKey],
    now: DateTime<Utc>,
) -> Result<usize, StorageError> {
    let ts = to_unix(now);
    let mut inserted = 0;
    for chunk in keys.chunks(INSERT_CHUNK) {
        let rows = vec!["(?, ?, ?, ?, ?)"; chunk.len()].join(", ");
        let sql = format!(
            "INSERT OR IGNORE INTO feature_assignments
             (feature_id, assignable_type, assignable_id, created_at, updated_at)
             VALUES {rows}"
        );
        let mut values = Vec::with_capacity(chunk.len() * 5);
        for key in chunk {
            values.push(Value::Integer(key.feature_id));
            values.push(Value::Text(kind.to_string()));
            values.push(Value::Integer(key.assignable_id));
            values.push(Value::Integer(ts));
            values.push(Value::Integer(ts));
        }
        inserted += conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(sqe)?;
    }
    Ok(inserted)
}

/// Delete exactly the given keys of type `kind`.
pub fn delete_keys(conn: &Connection, kind: &str, keys: &[AssignmentKey]) -> Result<usize, StorageError> {
    let mut deleted = 0;
    for chunk in keys.chunks(DELETE_CHUNK) {
        let rows = vec!["(?, ?)"; chunk.len()].join(", ");
        let sql = format!(
            "DELETE FROM feature_assignments
             WHERE assignable_type = ? AND (assignable_id, feature_id) IN (VALUES {rows})"
        );
        let mut values = Vec::with_capacity(1 + chunk.len() * 2);
        values.push(Value::Text(kind.to_string()));
        for key in chunk {
            values.push(Value::Integer(key.assignable_id));
            values.push(Value::Integer(key.feature_id));
        }
        deleted += conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(sqe)?;
    }
    Ok(deleted)
}

/// Diff `batch` against existing rows and write the difference.
///
/// The existence read, the diff and the write share one IMMEDIATE
/// transaction, so no other writer can interleave. Any error drops the
/// transaction, which rolls every write back.
pub fn apply_batch(
    conn: &Connection,
    batch: &AssignmentBatch,
    now: DateTime<Utc>,
) -> Result<BulkWriteStats, StorageError> {
    if batch.is_empty() {
        return Ok(BulkWriteStats::default());
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(sqe)?;
    let existing = existing_pairs(&tx, &batch.kind, &batch.assignable_ids, &batch.feature_ids)?;
    let plan = batch.plan(&existing);

    let mut stats = BulkWriteStats {
        skipped: plan.already_satisfied,
        ..BulkWriteStats::default()
    };
    if plan.is_noop() {
        debug!(kind = %batch.kind, direction = %batch.direction, "bulk write is a no-op");
        return Ok(stats);
    }

    if !plan.inserts.is_empty() {
        stats.inserted = insert_keys(&tx, &batch.kind, &plan.inserts, now)?;
        stats.skipped += plan.inserts.len() - stats.inserted;
    }
    if !plan.deletes.is_empty() {
        stats.deleted = delete_keys(&tx, &batch.kind, &plan.deletes)?;
    }
    tx.commit().map_err(sqe)?;

    debug!(
        kind = %batch.kind,
        direction = %batch.direction,
        inserted = stats.inserted,
        deleted = stats.deleted,
        skipped = stats.skipped,
        "applied assignment batch"
    );
    Ok(stats)
}

pub fn assign(
    conn: &Connection,
    kind: &str,
    assignable_id: AssignableId,
    feature_id: FeatureId,
    now: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let ts = to_unix(now);
    let changed = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO feature_assignments
             (feature_id, assignable_type, assignable_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
        )
        .map_err(sqe)?
        .execute(params![feature_id, kind, assignable_id, ts])
        .map_err(sqe)?;
    Ok(changed > 0)
}

pub fn unassign(
    conn: &Connection,
    kind: &str,
    assignable_id: AssignableId,
    feature_id: FeatureId,
) -> Result<bool, StorageError> {
    let changed = conn
        .prepare_cached(
            "DELETE FROM feature_assignments
             WHERE assignable_type = ?1 AND assignable_id = ?2 AND feature_id = ?3",
        )
        .map_err(sqe)?
        .execute(params![kind, assignable_id, feature_id])
        .map_err(sqe)?;
    Ok(changed > 0)
}

pub fn clear_assignments(conn: &Connection, kind: &str, assignable_id: AssignableId) -> Result<usize, StorageError> {
    conn.prepare_cached(
        "DELETE FROM feature_assignments WHERE assignable_type = ?1 AND assignable_id = ?2",
    )
    .map_err(sqe)?
    .execute(params![kind, assignable_id])
    .map_err(sqe)
}

pub fn has_assignment(
    conn: &Connection,
    kind: &str,
    assignable_id: AssignableId,
    feature_ids: &[FeatureId],
) -> Result<bool, StorageError> {
    if feature_ids.is_empty() {
        return Ok(false);
    }
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM feature_assignments
         WHERE assignable_type = ? AND assignable_id = ? AND feature_id IN ({}))",
        placeholders(feature_ids.len())
    );
    let mut values = vec![Value::Text(kind.to_string()), Value::Integer(assignable_id)];
    values.extend(feature_ids.iter().map(|&id| Value::Integer(id)));
    conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))
        .map_err(sqe)
}

pub fn assigned_feature_ids(
    conn: &Connection,
    kind: &str,
    assignable_id: AssignableId,
) -> Result<Vec<FeatureId>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT feature_id FROM feature_assignments
             WHERE assignable_type = ?1 AND assignable_id = ?2 ORDER BY feature_id",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![kind, assignable_id], |row| row.get(0))
        .map_err(sqe)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sqe)
}

pub fn assignments_for_feature(conn: &Connection, feature_id: FeatureId) -> Result<Vec<FeatureAssignment>, StorageError> {
    collect_assignments(
        conn,
        &format!("SELECT {ASSIGNMENT_COLUMNS} FROM feature_assignments WHERE feature_id = ? ORDER BY id"),
        &[Value::Integer(feature_id)],
    )
}

pub fn assignments_for_type(conn: &Connection, kind: &str) -> Result<Vec<FeatureAssignment>, StorageError> {
    collect_assignments(
        conn,
        &format!("SELECT {ASSIGNMENT_COLUMNS} FROM feature_assignments WHERE assignable_type = ? ORDER BY id"),
        &[Value::Text(kind.to_string())],
    )
}

pub fn assignable_types_for_feature(conn: &Connection, feature_id: FeatureId) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT DISTINCT assignable_type FROM feature_assignments
             WHERE feature_id = ?1 ORDER BY assignable_type",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![feature_id], |row| row.get(0))
        .map_err(sqe)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sqe)
}

/// Count, first/last creation time and 7/14/30-day creation counts in one
/// aggregate pass. Windows are `(now - N days, now]`-inclusive on both ends.
pub fn activity_for(
    conn: &Connection,
    feature_id: FeatureId,
    kind: &str,
    now: DateTime<Utc>,
) -> Result<AssignmentActivity, StorageError> {
    let now_ts = to_unix(now);
    let since = |days: i64| to_unix(now - Duration::days(days));
    conn.prepare_cached(
        "SELECT COUNT(*), MIN(created_at), MAX(created_at),
                COALESCE(SUM(created_at >= ?3 AND created_at <= ?6), 0),
                COALESCE(SUM(created_at >= ?4 AND created_at <= ?6), 0),
                COALESCE(SUM(created_at >= ?5 AND created_at <= ?6), 0)
         FROM feature_assignments
         WHERE feature_id = ?1 AND assignable_type = ?2",
    )
    .map_err(sqe)?
    .query_row(
        params![feature_id, kind, since(7), since(14), since(30), now_ts],
        |row| {
            Ok(AssignmentActivity {
                count: row.get(0)?,
                first_created: row.get::<_, Option<i64>>(1)?.map(from_unix),
                last_created: row.get::<_, Option<i64>>(2)?.map(from_unix),
                past_7_days: row.get(3)?,
                past_14_days: row.get(4)?,
                past_30_days: row.get(5)?,
            })
        },
    )
    .map_err(sqe)
}

pub fn count_assignments(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM feature_assignments", [], |row| row.get(0))
        .map_err(sqe)
}
