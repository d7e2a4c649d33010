//! Population queries against a host table of assignables.
//!
//! `table` and `id_column` are interpolated into SQL; callers must pass
//! names already checked with `validate_sql_identifier`.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use switchyard_core::errors::StorageError;
use switchyard_core::types::{AssignableId, FeatureId};

use super::{placeholders, sqe};

/// Resolved SQL names of one assignable population.
#[derive(Debug, Clone, Copy)]
pub struct HostTable<'a> {
    pub kind: &'a str,
    pub table: &'a str,
    pub id_column: &'a str,
}

fn collect_ids(conn: &Connection, sql: &str, values: &[Value]) -> Result<Vec<AssignableId>, StorageError> {
    let mut stmt = conn.prepare_cached(sql).map_err(sqe)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), |row| row.get(0))
        .map_err(sqe)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sqe)
}

fn kind_and_features(kind: &str, feature_ids: &[FeatureId]) -> Vec<Value> {
    let mut values = Vec::with_capacity(1 + feature_ids.len());
    values.push(Value::Text(kind.to_string()));
    values.extend(feature_ids.iter().map(|&id| Value::Integer(id)));
    values
}

/// Members holding at least one of `feature_ids`.
pub fn with_features(
    conn: &Connection,
    host: HostTable<'_>,
    feature_ids: &[FeatureId],
) -> Result<Vec<AssignableId>, StorageError> {
    if feature_ids.is_empty() {
        return Ok(Vec::new());
    }
    let HostTable { table, id_column, .. } = host;
    let sql = format!(
        "SELECT DISTINCT t.\"{id_column}\" FROM \"{table}\" t
         INNER JOIN feature_assignments fa
             ON fa.assignable_id = t.\"{id_column}\" AND fa.assignable_type = ?
         WHERE fa.feature_id IN ({})
         ORDER BY t.\"{id_column}\"",
        placeholders(feature_ids.len())
    );
    collect_ids(conn, &sql, &kind_and_features(host.kind, feature_ids))
}

/// Members holding none of `feature_ids`: a LEFT JOIN anti-join, with the
/// feature filter inside the join condition so unmatched members survive.
pub fn without_features(
    conn: &Connection,
    host: HostTable<'_>,
    feature_ids: &[FeatureId],
) -> Result<Vec<AssignableId>, StorageError> {
    let HostTable { table, id_column, .. } = host;
    if feature_ids.is_empty() {
        let sql = format!("SELECT t.\"{id_column}\" FROM \"{table}\" t ORDER BY t.\"{id_column}\"");
        return collect_ids(conn, &sql, &[]);
    }
    let sql = format!(
        "SELECT DISTINCT t.\"{id_column}\" FROM \"{table}\" t
         LEFT JOIN feature_assignments fa
             ON fa.assignable_id = t.\"{id_column}\" AND fa.assignable_type = ?
            AND fa.feature_id IN ({})
         WHERE fa.id IS NULL
         ORDER BY t.\"{id_column}\"",
        placeholders(feature_ids.len())
    );
    collect_ids(conn, &sql, &kind_and_features(host.kind, feature_ids))
}

pub fn count(conn: &Connection, host: HostTable<'_>) -> Result<i64, StorageError> {
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", host.table), [], |row| row.get(0))
        .map_err(sqe)
}

pub fn exists(conn: &Connection, host: HostTable<'_>, id: AssignableId) -> Result<bool, StorageError> {
    let HostTable { table, id_column, .. } = host;
    conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM \"{table}\" WHERE \"{id_column}\" = ?1)"),
        params![id],
        |row| row.get(0),
    )
    .map_err(sqe)
}
