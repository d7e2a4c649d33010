#![allow(dead_code)]

use std::sync::Arc;

use switchyard_core::config::AssignableConfig;
use switchyard_core::errors::StorageError;
use switchyard_core::types::NewFeature;
use switchyard_core::SwitchyardConfig;
use switchyard_engine::Switchyard;
use switchyard_storage::SwitchyardStorageEngine;

pub fn sqe(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError { message: e.to_string() }
}

pub fn create_table(engine: &SwitchyardStorageEngine, table: &str, n: i64) {
    engine
        .with_writer(|conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (id INTEGER PRIMARY KEY, label TEXT)"
            ))
            .map_err(sqe)?;
            for i in 1..=n {
                conn.execute(
                    &format!("INSERT INTO {table} (id, label) VALUES (?1, ?2)"),
                    rusqlite::params![i, format!("{table}-{i}")],
                )
                .map_err(sqe)?;
            }
            Ok(())
        })
        .unwrap();
}

/// In-memory switchyard with `User` backed by a `users` table of `n` rows.
pub fn switchyard_with_users(n: i64) -> (Arc<SwitchyardStorageEngine>, Switchyard) {
    let engine = Arc::new(SwitchyardStorageEngine::open_in_memory().unwrap());
    create_table(&engine, "users", n);
    let config = SwitchyardConfig {
        assignables: vec![AssignableConfig::new("User", "users")],
        ..SwitchyardConfig::default()
    };
    let switchyard = Switchyard::from_engine(Arc::clone(&engine), &config).unwrap();
    (engine, switchyard)
}

pub fn active(switchyard: &Switchyard, name: &str) {
    switchyard.create_feature(NewFeature::new(name).active()).unwrap();
}
