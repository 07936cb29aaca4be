//! Opening the local chat database.
//!
//! Every constructor brings the schema up to date before handing out a
//! [`Database`], so callers never see an unmigrated connection.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Largest number of bound keys in a single `IN (...)` clause.
pub(crate) const MAX_BATCH_KEYS: usize = 500;

/// The single SQLite connection backing the offline layer.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Platform data location of the default database file:
    /// - Linux:   `~/.local/share/parley/parley.db`
    /// - macOS:   `~/Library/Application Support/io.parley.parley/parley.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\parley\parley\data\parley.db`
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("io", "parley", "parley").ok_or(StoreError::NoDataDir)?;
        Ok(project_dirs.data_dir().join("parley.db"))
    }

    /// Open the database at [`Database::default_path`].
    pub fn open_default() -> Result<Self> {
        Self::open_at(&Self::default_path()?)
    }

    /// Open (or create) a database at an explicit path, creating missing
    /// parent directories.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Open a private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Raw connection, for the per-table query modules.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// On-disk location, or `None` for an in-memory database.
    pub fn path(&self) -> Option<PathBuf> {
        self.conn
            .path()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    /// Wipe every entity table. Used on logout and database reset.
    ///
    /// Returns the number of rows removed.
    pub fn clear_all(&self) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut removed = 0;
        for table in ["messages", "channels", "users"] {
            removed += tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        tx.commit()?;
        tracing::info!(removed, "cleared local database");
        Ok(removed)
    }
}

/// `?, ?, ?` for an `IN (...)` clause with `n` keys.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
