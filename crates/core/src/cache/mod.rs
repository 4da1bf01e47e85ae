//! Persistent cache of resolved stream lists.
//!
//! Resolutions are keyed by [`MediaId::cache_key`](crate::identifier::MediaId::cache_key)
//! so repeated requests for the same title skip the whole pipeline until the
//! entry expires.

mod sqlite;

pub use sqlite::SqliteStreamCache;

use std::time::Duration;

use thiserror::Error;

use crate::streams::StreamDescriptor;

/// Errors from the stream cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    #[error("Cache lock poisoned")]
    Lock,
}

/// Trait for stream list storage.
pub trait StreamCache: Send + Sync {
    /// Get an unexpired entry.
    fn get(&self, key: &str) -> Result<Option<Vec<StreamDescriptor>>, CacheError>;

    /// Store an entry, replacing any previous value for the key.
    fn set(&self, key: &str, streams: &[StreamDescriptor], ttl: Duration)
        -> Result<(), CacheError>;

    /// Delete expired entries. Returns how many were removed.
    fn purge_expired(&self) -> Result<usize, CacheError>;
}
