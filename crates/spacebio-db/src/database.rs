//! Database connection and table management.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{DbError, Result};
use crate::schema;

/// Main database handle. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub path: String,
    pub papers: u64,
    pub with_doi: u64,
    pub with_osdr: u64,
}

impl Database {
    /// Open or create a database file at the specified path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let path_str = path.to_string_lossy().to_string();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = tokio::task::spawn_blocking(move || Connection::open(&path)).await??;
        info!(path = %path_str, "Opened paper database");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: path_str,
        })
    }

    /// Open a private in-memory database. Used by tests and ephemeral runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: ":memory:".to_string(),
        })
    }

    /// Get the database path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Create tables and indexes if they don't exist.
    pub async fn initialize(&self) -> Result<()> {
        self.call(|conn| {
            conn.execute_batch(schema::CREATE_PAPERS_SQL)?;
            Ok(())
        })
        .await?;
        debug!(path = %self.path, "Schema initialized");
        Ok(())
    }

    /// Run `f` against the connection on the blocking pool.
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| DbError::Poisoned)?;
            f(&mut guard)
        })
        .await?
    }

    pub async fn stats(&self) -> Result<DatabaseStats> {
        let path = self.path.clone();
        self.call(move |conn| {
            let count = |sql: &str| -> Result<u64> {
                let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
                Ok(n.max(0) as u64)
            };
            Ok(DatabaseStats {
                path,
                papers: count("SELECT COUNT(*) FROM papers")?,
                with_doi: count("SELECT COUNT(*) FROM papers WHERE has_doi = 1")?,
                with_osdr: count("SELECT COUNT(*) FROM papers WHERE has_osdr = 1")?,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().await.unwrap();
        db.initialize().await.unwrap();
        let stats = db.stats().await.unwrap();
        assert_eq!(stats.papers, 0);
        assert_eq!(stats.path, ":memory:");
    }

    #[tokio::test]
    async fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("papers.db");
        let db = Database::open(&path).await.unwrap();
        db.initialize().await.unwrap();
        assert!(path.exists());
    }
}
