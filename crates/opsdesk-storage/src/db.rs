//! Database connection management.
//!
//! Wraps a single rusqlite Connection in a Mutex. Configures WAL mode and
//! foreign keys on open, then runs pending migrations.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use opsdesk_core::error::OpsdeskError;

use crate::migrations;

/// Thread-safe SQLite database wrapper.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path.
    pub fn new(path: &Path) -> Result<Self, OpsdeskError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| OpsdeskError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| OpsdeskError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!(path = %path.display(), "Database opened");

        Self::finish(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, OpsdeskError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| OpsdeskError::Storage(format!("Failed to open in-memory db: {}", e)))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| OpsdeskError::Storage(format!("Failed to set pragmas: {}", e)))?;

        Self::finish(conn)
    }

    fn finish(conn: Connection) -> Result<Self, OpsdeskError> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// The mutex is held for the duration of the closure, so a transaction
    /// opened inside it cannot interleave with another caller.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, OpsdeskError>
    where
        F: FnOnce(&Connection) -> Result<T, OpsdeskError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| OpsdeskError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}
