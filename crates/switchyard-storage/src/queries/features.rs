//! features table queries.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use switchyard_core::errors::StorageError;
use switchyard_core::types::{
    Feature, FeatureId, FeatureQuery, FeatureStatus, FeatureUpdate, NewFeature, ScopeFilter,
};

use super::{from_unix, sqe, sqe_unique, to_unix};

const FEATURE_COLUMNS: &str = "id, name, identifier, description, group_name, environment, \
                               tenant_id, status, created_at, updated_at";

fn row_to_feature(row: &Row<'_>) -> rusqlite::Result<Feature> {
    Ok(Feature {
        id: row.get(0)?,
        name: row.get(1)?,
        identifier: row.get(2)?,
        description: row.get(3)?,
        group: row.get(4)?,
        environment: row.get(5)?,
        tenant_id: row.get(6)?,
        status: FeatureStatus::from_i64(row.get(7)?),
        created_at: from_unix(row.get(8)?),
        updated_at: from_unix(row.get(9)?),
    })
}

pub fn insert_feature(
    conn: &Connection,
    feature: &NewFeature,
    now: DateTime<Utc>,
) -> Result<Feature, StorageError> {
    let identifier = feature.resolved_identifier();
    let ts = to_unix(now);
    conn.prepare_cached(
        "INSERT INTO features
         (name, identifier, description, group_name, environment, tenant_id, status,
          created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
    )
    .map_err(sqe)?
    .execute(params![
        feature.name,
        identifier,
        feature.description,
        feature.group,
        feature.environment,
        feature.tenant_id,
        feature.status.as_i64(),
        ts,
    ])
    .map_err(|e| {
        sqe_unique(e, |column| match column {
            "name" => feature.name.clone(),
            _ => identifier.clone(),
        })
    })?;

    let id = conn.last_insert_rowid();
    get_feature(conn, id)?.ok_or_else(|| StorageError::NotFound {
        entity: "feature".into(),
        key: id.to_string(),
    })
}

pub fn get_feature(conn: &Connection, id: FeatureId) -> Result<Option<Feature>, StorageError> {
    conn.prepare_cached(&format!("SELECT {FEATURE_COLUMNS} FROM features WHERE id = ?1"))
        .map_err(sqe)?
        .query_row(params![id], row_to_feature)
        .optional()
        .map_err(sqe)
}

pub fn find_feature(conn: &Connection, identifier: &str) -> Result<Option<Feature>, StorageError> {
    conn.prepare_cached(&format!(
        "SELECT {FEATURE_COLUMNS} FROM features WHERE identifier = ?1"
    ))
    .map_err(sqe)?
    .query_row(params![identifier], row_to_feature)
    .optional()
    .map_err(sqe)
}

/// Build the WHERE clause for `query`. Every filter is ANDed.
fn where_clause(query: &FeatureQuery) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if !query.identifiers.is_empty() {
        clauses.push(format!(
            "identifier IN ({})",
            super::placeholders(query.identifiers.len())
        ));
        values.extend(query.identifiers.iter().cloned().map(Value::Text));
    }

    let scopes = [
        ("group_name", &query.group),
        ("environment", &query.environment),
        ("tenant_id", &query.tenant_id),
    ];
    for (column, filter) in scopes {
        match filter {
            Some(ScopeFilter::Equals(v)) => {
                clauses.push(format!("{column} = ?"));
                values.push(Value::Text(v.clone()));
            }
            Some(ScopeFilter::Missing) => clauses.push(format!("{column} IS NULL")),
            None => {}
        }
    }

    if let Some(status) = query.status {
        clauses.push("status = ?".to_string());
        values.push(Value::Integer(status.as_i64()));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

pub fn query_features(conn: &Connection, query: &FeatureQuery) -> Result<Vec<Feature>, StorageError> {
    let (where_sql, values) = where_clause(query);
    let sql = format!("SELECT {FEATURE_COLUMNS} FROM features{where_sql} ORDER BY id");
    let mut stmt = conn.prepare(&sql).map_err(sqe)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), row_to_feature)
        .map_err(sqe)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sqe)
}

pub fn update_feature(
    conn: &Connection,
    id: FeatureId,
    update: &FeatureUpdate,
    now: DateTime<Utc>,
) -> Result<Option<Feature>, StorageError> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(sqe)?;
    let Some(current) = get_feature(&tx, id)? else {
        return Ok(None);
    };
    let next = update.apply_to(&current);
    tx.prepare_cached(
        "UPDATE features
         SET name = ?2, description = ?3, group_name = ?4, environment = ?5,
             tenant_id = ?6, status = ?7, updated_at = ?8
         WHERE id = ?1",
    )
    .map_err(sqe)?
    .execute(params![
        id,
        next.name,
        next.description,
        next.group,
        next.environment,
        next.tenant_id,
        next.status.as_i64(),
        to_unix(now),
    ])
    .map_err(|e| sqe_unique(e, |_| next.name.clone()))?;
    let stored = get_feature(&tx, id)?;
    tx.commit().map_err(sqe)?;
    Ok(stored)
}

pub fn set_feature_status(
    conn: &Connection,
    id: FeatureId,
    status: FeatureStatus,
    now: DateTime<Utc>,
) -> Result<Option<Feature>, StorageError> {
    let changed = conn
        .prepare_cached("UPDATE features SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .map_err(sqe)?
        .execute(params![id, status.as_i64(), to_unix(now)])
        .map_err(sqe)?;
    if changed == 0 {
        return Ok(None);
    }
    get_feature(conn, id)
}

/// Delete a feature and its assignments atomically. Returns the number of
/// assignments removed, or `None` if the feature did not exist.
pub fn delete_feature(conn: &Connection, id: FeatureId) -> Result<Option<usize>, StorageError> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(sqe)?;
    let removed = tx
        .prepare_cached("DELETE FROM feature_assignments WHERE feature_id = ?1")
        .map_err(sqe)?
        .execute(params![id])
        .map_err(sqe)?;
    let deleted = tx
        .prepare_cached("DELETE FROM features WHERE id = ?1")
        .map_err(sqe)?
        .execute(params![id])
        .map_err(sqe)?;
    if deleted == 0 {
        // Nothing to cascade from; dropping `tx` rolls back.
        return Ok(None);
    }
    tx.commit().map_err(sqe)?;
    Ok(Some(removed))
}

pub fn count_features(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM features", [], |row| row.get(0))
        .map_err(sqe)
}
