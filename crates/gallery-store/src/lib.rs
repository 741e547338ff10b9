pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;

pub use error::{Result, StoreError};

use std::path::Path;
use std::sync::{Arc, Mutex};

use gallery_hash::CredentialHasher;
use rusqlite::Connection;
use tracing::info;

/// Explicit store handle, constructed once at startup and shared by
/// reference — there is no ambient global database.
pub struct Database {
    conn: Mutex<Connection>,
    hasher: Arc<dyn CredentialHasher>,
}

impl Database {
    /// Opens (creating on first use) the gallery database and brings the
    /// schema up to the current version. Safe to call against an already
    /// initialized file: migrations that have run are skipped.
    pub fn open(path: &Path, hasher: Arc<dyn CredentialHasher>) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run(&conn, hasher.as_ref())?;

        info!("Gallery database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            hasher,
        })
    }

    /// In-memory database with the same schema. Used by tests.
    pub fn open_in_memory(hasher: Arc<dyn CredentialHasher>) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;

        migrations::run(&conn, hasher.as_ref())?;

        Ok(Self {
            conn: Mutex::new(conn),
            hasher,
        })
    }

    /// The credential hasher this store was built with. The auth gateway
    /// verifies against stored hashes through this, so store and gateway
    /// always agree on the algorithm.
    pub fn hasher(&self) -> &dyn CredentialHasher {
        self.hasher.as_ref()
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::StorageUnavailable(format!("DB lock poisoned: {e}")))?;
        f(&conn)
    }
}
