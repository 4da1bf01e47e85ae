//! SQLite-backed stream cache implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{CacheError, StreamCache};
use crate::streams::StreamDescriptor;

/// SQLite-backed stream cache.
pub struct SqliteStreamCache {
    conn: Mutex<Connection>,
}

impl SqliteStreamCache {
    /// Open the cache, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path).map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self, CacheError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS stream_cache (
                cache_key TEXT PRIMARY KEY,
                streams TEXT NOT NULL,
                stream_count INTEGER NOT NULL,
                stored_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_stream_cache_expires ON stream_cache(expires_at);
            "#,
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::Lock)
    }

    /// Store an entry with an explicit expiry instant.
    fn store(
        &self,
        key: &str,
        streams: &[StreamDescriptor],
        expires_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let payload =
            serde_json::to_string(streams).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO stream_cache (cache_key, streams, stream_count, stored_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(cache_key) DO UPDATE SET
                streams = excluded.streams,
                stream_count = excluded.stream_count,
                stored_at = excluded.stored_at,
                expires_at = excluded.expires_at",
            params![
                key,
                payload,
                streams.len() as i64,
                timestamp(Utc::now()),
                timestamp(expires_at),
            ],
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(())
    }
}

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl StreamCache for SqliteStreamCache {
    fn get(&self, key: &str) -> Result<Option<Vec<StreamDescriptor>>, CacheError> {
        let conn = self.conn()?;

        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT streams, expires_at FROM stream_cache WHERE cache_key = ?",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| CacheError::Database(e.to_string()))?;

        let Some((payload, expires_at)) = row else {
            return Ok(None);
        };

        // Unparseable expiry counts as expired
        let expired = DateTime::parse_from_rfc3339(&expires_at)
            .map(|dt| dt.with_timezone(&Utc) <= Utc::now())
            .unwrap_or(true);
        if expired {
            debug!(key, "Stream cache entry expired");
            return Ok(None);
        }

        let streams = serde_json::from_str(&payload)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        Ok(Some(streams))
    }

    fn set(
        &self,
        key: &str,
        streams: &[StreamDescriptor],
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| CacheError::InvalidTtl(format!("{}s is out of range", ttl.as_secs())))?;
        self.store(key, streams, expires_at)
    }

    fn purge_expired(&self) -> Result<usize, CacheError> {
        let conn = self.conn()?;
        let removed = conn
            .execute(
                "DELETE FROM stream_cache WHERE expires_at <= ?",
                params![timestamp(Utc::now())],
            )
            .map_err(|e| CacheError::Database(e.to_string()))?;
        Ok(removed)
    }
}
