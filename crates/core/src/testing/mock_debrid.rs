//! Mock debrid service for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::debrid::{CacheChecker, CacheStatus, DebridError, LinkResolver};
use crate::magnet::parse_magnet;

/// Mock implementation of both debrid capabilities.
///
/// Cache statuses and links are keyed by lowercase info hash. Hashes with no
/// configured link resolve to `Ok(None)`.
#[derive(Debug, Default)]
pub struct MockDebrid {
    statuses: Arc<RwLock<HashMap<String, CacheStatus>>>,
    links: Arc<RwLock<HashMap<String, String>>>,
    /// Hints passed to `resolve_link`, in call order.
    hints: Arc<RwLock<Vec<String>>>,
    check_fails: Arc<RwLock<bool>>,
    resolve_fails: Arc<RwLock<bool>>,
    resolve_delay: Arc<RwLock<Option<Duration>>>,
    check_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
}

impl MockDebrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a hash as cached under the given name.
    pub async fn set_cached(&self, info_hash: &str, filename: &str) {
        self.statuses.write().await.insert(
            info_hash.to_ascii_lowercase(),
            CacheStatus {
                is_cached: true,
                filename: Some(filename.to_string()),
            },
        );
    }

    /// Set the direct link returned for a hash.
    pub async fn set_link(&self, info_hash: &str, url: &str) {
        self.links
            .write()
            .await
            .insert(info_hash.to_ascii_lowercase(), url.to_string());
    }

    /// Make bulk cache checks fail.
    pub async fn set_check_fails(&self, fails: bool) {
        *self.check_fails.write().await = fails;
    }

    /// Make link resolution fail.
    pub async fn set_resolve_fails(&self, fails: bool) {
        *self.resolve_fails.write().await = fails;
    }

    /// Delay every link resolution.
    pub async fn set_resolve_delay(&self, delay: Duration) {
        *self.resolve_delay.write().await = Some(delay);
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub async fn recorded_hints(&self) -> Vec<String> {
        self.hints.read().await.clone()
    }
}

#[async_trait]
impl CacheChecker for MockDebrid {
    async fn check_cached(
        &self,
        info_hashes: &[String],
    ) -> Result<HashMap<String, CacheStatus>, DebridError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);

        if *self.check_fails.read().await {
            return Err(DebridError::ApiError {
                status: 503,
                message: "mock cache check failure".to_string(),
            });
        }

        let statuses = self.statuses.read().await;
        Ok(info_hashes
            .iter()
            .filter_map(|hash| statuses.get(hash).map(|s| (hash.clone(), s.clone())))
            .collect())
    }
}

#[async_trait]
impl LinkResolver for MockDebrid {
    async fn resolve_link(
        &self,
        magnet_uri: &str,
        hint: Option<&str>,
    ) -> Result<Option<String>, DebridError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hint) = hint {
            self.hints.write().await.push(hint.to_string());
        }

        let delay = *self.resolve_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.resolve_fails.read().await {
            return Err(DebridError::Rejected("mock link failure".to_string()));
        }

        let Some(magnet) = parse_magnet(Some(magnet_uri)) else {
            return Err(DebridError::Rejected("invalid magnet".to_string()));
        };

        Ok(self.links.read().await.get(&magnet.info_hash).cloned())
    }
}
