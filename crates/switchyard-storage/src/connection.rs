//! DatabaseManager: one writer + a read pool with round-robin selection.
//!
//! The only place in the storage crate that holds `Mutex<Connection>`.
//! All other code goes through `with_writer` / `with_reader`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags};
use switchyard_core::config::StorageConfig;
use switchyard_core::errors::StorageError;
use tracing::debug;

use crate::migrations;
use crate::pragmas::{configure_connection, configure_readonly_connection};

pub struct DatabaseManager {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    read_index: AtomicUsize,
    path: Option<PathBuf>,
}

impl DatabaseManager {
    /// Open a file-backed database, creating and migrating it as needed.
    ///
    /// Readers are opened read-only after the writer has migrated the schema.
    pub fn open(path: &Path, config: &StorageConfig) -> Result<Self, StorageError> {
        let busy_timeout = config.effective_busy_timeout_ms();

        let writer = Connection::open(path).map_err(|e| StorageError::SqliteError {
            message: format!("failed to open writer at {}: {e}", path.display()),
        })?;
        configure_connection(&writer, busy_timeout)?;
        migrations::migrate(&writer)?;

        let pool_size = config.effective_read_pool_size();
        let mut readers = Vec::with_capacity(pool_size);
        for i in 0..pool_size {
            let reader = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| StorageError::SqliteError {
                message: format!("failed to open reader {i}: {e}"),
            })?;
            configure_readonly_connection(&reader, busy_timeout)?;
            readers.push(Mutex::new(reader));
        }

        debug!(path = %path.display(), readers = pool_size, "opened database");
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            read_index: AtomicUsize::new(0),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database. Reads fall back to the writer, since
    /// separate in-memory connections never share data.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let writer = Connection::open_in_memory().map_err(|e| StorageError::SqliteError {
            message: format!("failed to open in-memory writer: {e}"),
        })?;
        configure_connection(&writer, StorageConfig::default().effective_busy_timeout_ms())?;
        migrations::migrate(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            read_index: AtomicUsize::new(0),
            path: None,
        })
    }

    /// Open per `config`: file-backed when a path is set, in-memory otherwise.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        match config.path.as_deref() {
            Some(path) => Self::open(path, config),
            None => Self::open_in_memory(),
        }
    }

    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let conn = self.writer.lock().map_err(|e| StorageError::SqliteError {
            message: format!("writer lock poisoned: {e}"),
        })?;
        f(&conn)
    }

    /// Run `f` on a reader (round-robin), or on the writer when there are
    /// no readers.
    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        if self.readers.is_empty() {
            return self.with_writer(f);
        }
        let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[index].lock().map_err(|e| StorageError::SqliteError {
            message: format!("reader lock poisoned: {e}"),
        })?;
        f(&conn)
    }

    /// Database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    pub fn checkpoint(&self) -> Result<(), StorageError> {
        self.with_writer(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(|e| StorageError::SqliteError { message: e.to_string() })
        })
    }
}
