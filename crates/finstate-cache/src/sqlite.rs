//! SQLite-based cache implementation.

use async_trait::async_trait;
use chrono::Utc;
use finstate_core::{CorpEntry, DataError, DirectoryCache, Result};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument};

/// SQLite-based directory cache.
///
/// Stores the corporate directory in a SQLite database file so the bulk download
/// survives application restarts.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Create a new SQLite cache at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| DataError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory SQLite cache.
    ///
    /// Useful for testing; data is lost when the cache is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| DataError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS directory_cache (
                provider TEXT NOT NULL,
                corp_code TEXT NOT NULL,
                corp_name TEXT NOT NULL,
                stock_code TEXT,
                modify_date TEXT,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (provider, corp_code)
            )",
            [],
        )
        .map_err(|e| DataError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_directory_provider_stock
             ON directory_cache(provider, stock_code)",
            [],
        )
        .map_err(|e| DataError::Cache(e.to_string()))?;

        debug!("SQLite cache schema initialized");
        Ok(())
    }
}

#[async_trait]
impl DirectoryCache for SqliteCache {
    #[instrument(skip(self), fields(provider = %provider))]
    async fn get_directory(&self, provider: &str) -> Result<Option<Vec<CorpEntry>>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Cache(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT corp_code, corp_name, stock_code, modify_date
                 FROM directory_cache
                 WHERE provider = ?1
                 ORDER BY corp_code ASC",
            )
            .map_err(|e| DataError::Cache(e.to_string()))?;

        let rows = stmt
            .query_map(params![provider], |row| {
                Ok(CorpEntry {
                    corp_code: row.get(0)?,
                    corp_name: row.get(1)?,
                    stock_code: row.get(2)?,
                    modify_date: row.get(3)?,
                })
            })
            .map_err(|e| DataError::Cache(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| DataError::Cache(e.to_string()))?);
        }

        if entries.is_empty() {
            debug!("Cache miss for corporate directory");
            return Ok(None);
        }

        debug!("Found {} cached directory entries", entries.len());
        Ok(Some(entries))
    }

    #[instrument(skip(self, entries), fields(provider = %provider, count = entries.len()))]
    async fn put_directory(&self, provider: &str, entries: &[CorpEntry]) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();

        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Cache(e.to_string()))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| DataError::Cache(e.to_string()))?;

        tx.execute(
            "DELETE FROM directory_cache WHERE provider = ?1",
            params![provider],
        )
        .map_err(|e| DataError::Cache(e.to_string()))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO directory_cache
                     (provider, corp_code, corp_name, stock_code, modify_date, cached_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(|e| DataError::Cache(e.to_string()))?;

            for entry in entries {
                stmt.execute(params![
                    provider,
                    entry.corp_code,
                    entry.corp_name,
                    entry.stock_code,
                    entry.modify_date,
                    cached_at,
                ])
                .map_err(|e| DataError::Cache(e.to_string()))?;
            }
        }

        tx.commit().map_err(|e| DataError::Cache(e.to_string()))?;

        debug!("Cached {} directory entries", entries.len());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(ttl)
                .map_err(|e| DataError::Cache(format!("Invalid TTL duration: {}", e)))?;
        let cutoff_str = cutoff.to_rfc3339();

        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Cache(e.to_string()))?;

        let deleted = conn
            .execute(
                "DELETE FROM directory_cache WHERE cached_at < ?1",
                params![cutoff_str],
            )
            .map_err(|e| DataError::Cache(e.to_string()))?;

        if deleted > 0 {
            debug!("Invalidated {} stale directory entries", deleted);
        }

        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DataError::Cache(e.to_string()))?;

        conn.execute("DELETE FROM directory_cache", [])
            .map_err(|e| DataError::Cache(e.to_string()))?;

        debug!("Cleared all cache entries");
        Ok(())
    }
}
