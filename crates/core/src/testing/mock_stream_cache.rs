//! In-memory stream cache for testing.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::cache::{CacheError, StreamCache};
use crate::streams::StreamDescriptor;

#[derive(Debug, Clone)]
struct Entry {
    streams: Vec<StreamDescriptor>,
    ttl: Duration,
    stored_at: Instant,
}

/// Mock implementation of the StreamCache trait.
///
/// Honors TTLs against the monotonic clock and remembers the TTL of the last
/// write per key for assertions.
#[derive(Debug, Default)]
pub struct MockStreamCache {
    entries: Mutex<HashMap<String, Entry>>,
    fail: Mutex<bool>,
}

impl MockStreamCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail.
    pub fn set_fail(&self, fail: bool) {
        if let Ok(mut flag) = self.fail.lock() {
            *flag = fail;
        }
    }

    /// TTL used by the last write to `key`.
    pub fn last_ttl(&self, key: &str) -> Option<Duration> {
        self.entries.lock().ok()?.get(key).map(|e| e.ttl)
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<(), CacheError> {
        match self.fail.lock() {
            Ok(flag) if *flag => Err(CacheError::Database("mock cache failure".to_string())),
            Ok(_) => Ok(()),
            Err(_) => Err(CacheError::Lock),
        }
    }
}

impl StreamCache for MockStreamCache {
    fn get(&self, key: &str) -> Result<Option<Vec<StreamDescriptor>>, CacheError> {
        self.check()?;
        let entries = self.entries.lock().map_err(|_| CacheError::Lock)?;
        Ok(entries
            .get(key)
            .filter(|e| e.stored_at.elapsed() < e.ttl)
            .map(|e| e.streams.clone()))
    }

    fn set(
        &self,
        key: &str,
        streams: &[StreamDescriptor],
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.check()?;
        self.entries.lock().map_err(|_| CacheError::Lock)?.insert(
            key.to_string(),
            Entry {
                streams: streams.to_vec(),
                ttl,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, CacheError> {
        self.check()?;
        let mut entries = self.entries.lock().map_err(|_| CacheError::Lock)?;
        let before = entries.len();
        entries.retain(|_, e| e.stored_at.elapsed() < e.ttl);
        Ok(before - entries.len())
    }
}
