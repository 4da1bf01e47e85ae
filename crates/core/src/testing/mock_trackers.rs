//! Mock tracker list source for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::trackers::{TrackerError, TrackerSource};

/// Mock implementation of the TrackerSource trait that counts fetches.
#[derive(Debug)]
pub struct MockTrackerSource {
    trackers: Arc<RwLock<Vec<String>>>,
    fail: Arc<RwLock<bool>>,
    delay: Arc<RwLock<Option<Duration>>>,
    fetches: AtomicUsize,
}

impl MockTrackerSource {
    pub fn new(trackers: Vec<String>) -> Self {
        Self {
            trackers: Arc::new(RwLock::new(trackers)),
            fail: Arc::new(RwLock::new(false)),
            delay: Arc::new(RwLock::new(None)),
            fetches: AtomicUsize::new(0),
        }
    }

    pub async fn set_trackers(&self, trackers: Vec<String>) {
        *self.trackers.write().await = trackers;
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Delay every fetch, so concurrent callers overlap.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Number of fetches started.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackerSource for MockTrackerSource {
    async fn fetch(&self) -> Result<Vec<String>, TrackerError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.fail.read().await {
            return Err(TrackerError::Other("mock tracker failure".to_string()));
        }

        Ok(self.trackers.read().await.clone())
    }
}
