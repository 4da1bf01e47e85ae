//! Process-wide memoized tracker list.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use crate::metrics;

use super::{TrackerError, TrackerSource};

type PendingFetch = Shared<BoxFuture<'static, Result<Arc<Vec<String>>, Arc<TrackerError>>>>;

enum Slot {
    Empty,
    Pending(PendingFetch),
    Ready(Arc<Vec<String>>),
}

struct State {
    slot: Slot,
}

impl State {
    /// Whether `fetch` is still the in-flight fetch. A reset or a newer
    /// fetch started after a failure replaces it.
    fn is_pending(&self, fetch: &PendingFetch) -> bool {
        matches!(&self.slot, Slot::Pending(pending) if pending.ptr_eq(fetch))
    }
}

/// Memoized supplementary tracker list with a single in-flight fetch.
///
/// Concurrent callers during a miss await the same pending fetch. A
/// successful result is kept until [`reset`](Self::reset); a failed fetch
/// yields an empty list and is retried by the next caller.
pub struct TrackerRegistry {
    source: Option<Arc<dyn TrackerSource>>,
    state: Mutex<State>,
}

impl TrackerRegistry {
    pub fn new(source: Arc<dyn TrackerSource>) -> Self {
        Self::with_source(Some(source))
    }

    /// A registry with no source; always returns an empty list.
    pub fn disabled() -> Self {
        Self::with_source(None)
    }

    fn with_source(source: Option<Arc<dyn TrackerSource>>) -> Self {
        Self {
            source,
            state: Mutex::new(State { slot: Slot::Empty }),
        }
    }

    /// Get the tracker list, fetching it if needed.
    pub async fn get(&self) -> Vec<String> {
        let Some(source) = &self.source else {
            return Vec::new();
        };

        let fetch = {
            let mut state = self.lock();
            match &state.slot {
                Slot::Ready(list) => return list.as_ref().clone(),
                Slot::Pending(fetch) => fetch.clone(),
                Slot::Empty => {
                    let source = Arc::clone(source);
                    let fetch = async move {
                        let start = Instant::now();
                        let result = source.fetch().await;
                        let outcome = if result.is_ok() { "success" } else { "failure" };
                        metrics::observe_external("trackers", outcome, start);
                        result.map(Arc::new).map_err(Arc::new)
                    }
                    .boxed()
                    .shared();
                    state.slot = Slot::Pending(fetch.clone());
                    fetch
                }
            }
        };

        let result = fetch.clone().await;

        let mut state = self.lock();
        let current = state.is_pending(&fetch);
        match result {
            Ok(list) => {
                if current {
                    debug!(count = list.len(), "Tracker list memoized");
                    state.slot = Slot::Ready(Arc::clone(&list));
                }
                list.as_ref().clone()
            }
            Err(e) => {
                if current {
                    state.slot = Slot::Empty;
                    metrics::SOFT_FAILURES.with_label_values(&["trackers"]).inc();
                    warn!(error = %e, "Tracker list fetch failed, continuing without supplementary trackers");
                }
                Vec::new()
            }
        }
    }

    /// Forget the memoized list. The next `get` fetches again.
    pub fn reset(&self) {
        self.lock().slot = Slot::Empty;
    }

    /// Whether a list is currently memoized.
    pub fn is_ready(&self) -> bool {
        matches!(self.lock().slot, Slot::Ready(_))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
