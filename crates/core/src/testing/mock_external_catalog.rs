//! Mock title lookup for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::external_catalog::{ExternalCatalogError, MetadataLookup, TitleInfo};
use crate::identifier::MediaKind;

/// Mock implementation of the MetadataLookup trait.
///
/// Titles are keyed by external id; unknown ids return `Ok(None)`.
#[derive(Debug)]
pub struct MockMetadataLookup {
    titles: Arc<RwLock<HashMap<String, TitleInfo>>>,
    /// Recorded (external_id, kind) lookups.
    lookups: Arc<RwLock<Vec<(String, MediaKind)>>>,
    /// If set, the next lookup will fail with this error.
    next_error: Arc<RwLock<Option<ExternalCatalogError>>>,
    /// Artificial latency applied to every lookup.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockMetadataLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMetadataLookup {
    pub fn new() -> Self {
        Self {
            titles: Arc::new(RwLock::new(HashMap::new())),
            lookups: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Register a title for an external id.
    pub async fn add_title(&self, external_id: &str, title: &str, year: Option<u32>) {
        self.titles.write().await.insert(
            external_id.to_string(),
            TitleInfo {
                title: title.to_string(),
                year,
            },
        );
    }

    /// Configure the next lookup to fail with the given error.
    pub async fn set_next_error(&self, error: ExternalCatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every lookup, e.g. to exercise timeouts.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get recorded lookups.
    pub async fn recorded_lookups(&self) -> Vec<(String, MediaKind)> {
        self.lookups.read().await.clone()
    }
}

#[async_trait]
impl MetadataLookup for MockMetadataLookup {
    async fn lookup(
        &self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<Option<TitleInfo>, ExternalCatalogError> {
        self.lookups
            .write()
            .await
            .push((external_id.to_string(), kind));

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(self.titles.read().await.get(external_id).cloned())
    }
}
