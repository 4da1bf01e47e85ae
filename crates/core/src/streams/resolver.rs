//! End-to-end stream resolution for one request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::StreamCache;
use crate::config::{AddonConfig, CacheConfig, SearcherConfig};
use crate::debrid::{CacheChecker, LinkResolver};
use crate::external_catalog::MetadataLookup;
use crate::identifier::{IdentifierError, MediaId};
use crate::metrics;
use crate::searcher::{CandidateSet, QueryBuilder, SearchError, Searcher};
use crate::trackers::TrackerRegistry;

use super::assemble::assemble;
use super::reconciler::{reconcile, DebridServices};
use super::types::StreamDescriptor;
use super::StreamContext;

/// Failures surfaced to the caller. Everything else degrades into fewer or
/// plainer streams.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error("Search backend error: {0}")]
    Search(#[from] SearchError),
}

impl ResolveError {
    /// Whether the request itself was bad, as opposed to a backend failure.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::Identifier(_))
    }
}

struct CachePolicy {
    store: Arc<dyn StreamCache>,
    ttl: Duration,
    empty_ttl: Duration,
}

/// Resolves `(kind, id)` requests into stream lists.
///
/// Collaborators are injected; only the searcher is mandatory.
pub struct StreamResolver {
    queries: QueryBuilder,
    debrid: Option<DebridServices>,
    trackers: Arc<TrackerRegistry>,
    cache: Option<CachePolicy>,
    branding: String,
    call_timeout: Duration,
}

impl StreamResolver {
    pub fn new(searcher: Arc<dyn Searcher>, searcher_config: SearcherConfig, addon: &AddonConfig) -> Self {
        let call_timeout = Duration::from_secs(addon.call_timeout_secs as u64);
        Self {
            queries: QueryBuilder::new(searcher, None, searcher_config, call_timeout),
            debrid: None,
            trackers: Arc::new(TrackerRegistry::disabled()),
            cache: None,
            branding: addon.branding.clone(),
            call_timeout,
        }
    }

    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataLookup>) -> Self {
        self.queries = self.queries.with_metadata(metadata);
        self
    }

    pub fn with_debrid(
        mut self,
        checker: Arc<dyn CacheChecker>,
        resolver: Arc<dyn LinkResolver>,
    ) -> Self {
        self.debrid = Some(DebridServices { checker, resolver });
        self
    }

    pub fn with_trackers(mut self, trackers: Arc<TrackerRegistry>) -> Self {
        self.trackers = trackers;
        self
    }

    pub fn with_cache(mut self, store: Arc<dyn StreamCache>, config: &CacheConfig) -> Self {
        self.cache = Some(CachePolicy {
            store,
            ttl: Duration::from_secs(config.ttl_secs),
            empty_ttl: Duration::from_secs(config.empty_ttl_secs),
        });
        self
    }

    pub fn branding(&self) -> &str {
        &self.branding
    }

    pub fn trackers(&self) -> &Arc<TrackerRegistry> {
        &self.trackers
    }

    /// Resolve a request into a stream list.
    pub async fn resolve(
        &self,
        kind: &str,
        raw_id: &str,
    ) -> Result<Vec<StreamDescriptor>, ResolveError> {
        let start = Instant::now();

        let id = match MediaId::parse(kind, raw_id) {
            Ok(id) => id,
            Err(e) => {
                finish(start, "invalid");
                return Err(e.into());
            }
        };

        let key = id.cache_key();
        if let Some(streams) = self.cached(&key) {
            debug!(key = %key, streams = streams.len(), "Serving cached streams");
            finish(start, "cache_hit");
            return Ok(streams);
        }

        let CandidateSet {
            plan,
            executed_query,
            candidates,
        } = match self.queries.find_candidates(&id).await {
            Ok(set) => set,
            Err(e) => {
                finish(start, "search_failed");
                return Err(e.into());
            }
        };

        metrics::CANDIDATES_FOUND
            .with_label_values(&[])
            .observe(candidates.len() as f64);

        let candidate_count = candidates.len();
        let streams = if candidates.is_empty() {
            Vec::new()
        } else {
            let ctx = StreamContext {
                branding: &self.branding,
                preferred_title: plan.preferred_title.as_deref(),
                season: id.season,
                episode: id.episode,
            };

            let (reconciled, trackers) = tokio::join!(
                reconcile(candidates, self.debrid.as_ref(), &ctx, self.call_timeout),
                self.supplementary_trackers(),
            );

            assemble(reconciled.direct, &reconciled.fallback, &trackers, &ctx)
        };

        self.store(&key, &streams);

        for stream in &streams {
            metrics::STREAMS_EMITTED
                .with_label_values(&[stream.variant_name()])
                .inc();
        }
        let direct = streams
            .iter()
            .filter(|s| matches!(s, StreamDescriptor::Direct(_)))
            .count();

        info!(
            kind = %id.kind,
            id = %id.external_id,
            season = ?id.season,
            episode = ?id.episode,
            query = %executed_query,
            candidates = candidate_count,
            direct,
            torrent = streams.len() - direct,
            duration_ms = start.elapsed().as_millis() as u64,
            "Resolved streams"
        );

        finish(start, if streams.is_empty() { "empty" } else { "streams" });
        Ok(streams)
    }

    async fn supplementary_trackers(&self) -> Vec<String> {
        match tokio::time::timeout(self.call_timeout, self.trackers.get()).await {
            Ok(trackers) => trackers,
            Err(_) => {
                metrics::SOFT_FAILURES.with_label_values(&["trackers"]).inc();
                warn!("Tracker list fetch timed out, continuing without supplementary trackers");
                Vec::new()
            }
        }
    }

    fn cached(&self, key: &str) -> Option<Vec<StreamDescriptor>> {
        let policy = self.cache.as_ref()?;
        match policy.store.get(key) {
            Ok(Some(streams)) => {
                metrics::RESULT_CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
                Some(streams)
            }
            Ok(None) => {
                metrics::RESULT_CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
                None
            }
            Err(e) => {
                metrics::RESULT_CACHE_LOOKUPS.with_label_values(&["error"]).inc();
                metrics::SOFT_FAILURES.with_label_values(&["result_cache"]).inc();
                warn!(key, error = %e, "Stream cache read failed, resolving fresh");
                None
            }
        }
    }

    fn store(&self, key: &str, streams: &[StreamDescriptor]) {
        let Some(policy) = &self.cache else {
            return;
        };
        let ttl = if streams.is_empty() {
            policy.empty_ttl
        } else {
            policy.ttl
        };
        if let Err(e) = policy.store.set(key, streams, ttl) {
            metrics::SOFT_FAILURES.with_label_values(&["result_cache"]).inc();
            warn!(key, error = %e, "Stream cache write failed");
        }
    }
}

fn finish(start: Instant, result: &str) {
    metrics::RESOLUTIONS.with_label_values(&[result]).inc();
    metrics::RESOLUTION_DURATION
        .with_label_values(&[result])
        .observe(start.elapsed().as_secs_f64());
}
