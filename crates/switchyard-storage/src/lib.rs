//! # switchyard-storage
//!
//! SQLite persistence layer for the Switchyard toggle engine.
//! WAL mode, write-serialized + read-pooled, schema migrations,
//! feature/assignment queries and table-backed assignable populations.

pub mod assignable_source;
pub mod connection;
pub mod engine;
pub mod migrations;
pub mod pragmas;
pub mod queries;
pub mod schema;

pub use assignable_source::SqliteAssignableSource;
pub use connection::DatabaseManager;
pub use engine::SwitchyardStorageEngine;
