//! Cache-status reconciliation.
//!
//! Splits candidates into those the debrid service can serve directly and
//! those that fall back to plain torrent streams, then resolves direct links
//! for the former concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, warn};

use crate::debrid::{CacheChecker, CacheStatus, DebridError, LinkResolver};
use crate::magnet::{parse_magnet, ParsedMagnet};
use crate::metrics;
use crate::searcher::TorrentCandidate;

use super::format::format_details;
use super::types::{BehaviorHints, DirectStream};
use super::StreamContext;

/// Debrid capabilities used during reconciliation.
#[derive(Clone)]
pub struct DebridServices {
    pub checker: Arc<dyn CacheChecker>,
    pub resolver: Arc<dyn LinkResolver>,
}

/// A candidate headed for a torrent stream, with its magnet parsed once.
#[derive(Debug, Clone)]
pub struct FallbackEntry {
    pub candidate: TorrentCandidate,
    pub magnet: Option<ParsedMagnet>,
    /// Whether the candidate carried a magnet URI at all.
    pub had_magnet: bool,
}

impl FallbackEntry {
    pub fn new(candidate: TorrentCandidate) -> Self {
        let uri = candidate.magnet_uri.as_deref().filter(|m| !m.is_empty());
        let had_magnet = uri.is_some();
        let magnet = parse_magnet(uri);
        Self {
            candidate,
            magnet,
            had_magnet,
        }
    }

    pub fn info_hash(&self) -> Option<&str> {
        self.magnet.as_ref().map(|m| m.info_hash.as_str())
    }
}

/// Result of reconciliation.
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    /// Resolved direct streams, in candidate order.
    pub direct: Vec<DirectStream>,
    /// Everything else, including candidates whose link resolution failed.
    pub fallback: Vec<FallbackEntry>,
}

/// Reconcile candidates against the debrid cache.
///
/// Never fails: a failed bulk check is treated as "nothing cached" and a
/// failed link resolution sends the candidate back to the fallback list.
pub async fn reconcile(
    candidates: Vec<TorrentCandidate>,
    debrid: Option<&DebridServices>,
    ctx: &StreamContext<'_>,
    call_timeout: Duration,
) -> Reconciled {
    let entries: Vec<FallbackEntry> = candidates.into_iter().map(FallbackEntry::new).collect();

    let Some(debrid) = debrid else {
        return Reconciled {
            direct: Vec::new(),
            fallback: entries,
        };
    };

    let mut hashes: Vec<String> = Vec::new();
    for hash in entries.iter().filter_map(FallbackEntry::info_hash) {
        if !hashes.iter().any(|h| h == hash) {
            hashes.push(hash.to_string());
        }
    }
    if hashes.is_empty() {
        return Reconciled {
            direct: Vec::new(),
            fallback: entries,
        };
    }

    let statuses = check_cached(debrid.checker.as_ref(), &hashes, call_timeout).await;

    let mut fallback: Vec<FallbackEntry> = Vec::new();
    let mut cached: Vec<(FallbackEntry, String)> = Vec::new();
    for entry in entries {
        let filename = entry
            .info_hash()
            .and_then(|hash| statuses.get(hash))
            .filter(|status| status.is_usable())
            .and_then(|status| status.filename.clone());
        match filename {
            Some(filename) => cached.push((entry, filename)),
            None => fallback.push(entry),
        }
    }

    debug!(
        cached = cached.len(),
        fallback = fallback.len(),
        "Debrid cache status reconciled"
    );

    let resolver = debrid.resolver.as_ref();
    let resolutions = join_all(cached.into_iter().map(|(entry, filename)| async move {
        let hint = link_hint(&entry.candidate, ctx);
        let link = resolve_link(resolver, &entry, &hint, call_timeout).await;
        (entry, filename, link)
    }))
    .await;

    let mut direct = Vec::new();
    for (entry, filename, link) in resolutions {
        match (link, entry.info_hash()) {
            (Some(url), Some(hash)) => direct.push(DirectStream {
                name: ctx.branding.to_string(),
                title: format!("{}\n{}", filename, format_details(&entry.candidate)),
                url,
                behavior_hints: BehaviorHints {
                    binge_group: format!("{}|{}", ctx.branding, hash),
                },
            }),
            _ => fallback.push(entry),
        }
    }

    Reconciled { direct, fallback }
}

/// File hint for the debrid service: title plus episode marker when known.
fn link_hint(candidate: &TorrentCandidate, ctx: &StreamContext<'_>) -> String {
    let title = ctx.preferred_title.unwrap_or(&candidate.title);
    match (ctx.season, ctx.episode) {
        (Some(season), Some(episode)) => format!("{} S{:02}E{:02}", title, season, episode),
        _ => title.to_string(),
    }
}

async fn check_cached(
    checker: &dyn CacheChecker,
    hashes: &[String],
    call_timeout: Duration,
) -> HashMap<String, CacheStatus> {
    let start = Instant::now();
    let result = tokio::time::timeout(call_timeout, checker.check_cached(hashes))
        .await
        .unwrap_or(Err(DebridError::Timeout));

    match result {
        Ok(statuses) => {
            metrics::observe_external("cache_check", "success", start);
            statuses
        }
        Err(e) => {
            let outcome = if matches!(e, DebridError::Timeout) {
                "timeout"
            } else {
                "failure"
            };
            metrics::observe_external("cache_check", outcome, start);
            metrics::SOFT_FAILURES.with_label_values(&["cache_check"]).inc();
            warn!(hashes = hashes.len(), error = %e, "Debrid cache check failed, treating all as uncached");
            HashMap::new()
        }
    }
}

async fn resolve_link(
    resolver: &dyn LinkResolver,
    entry: &FallbackEntry,
    hint: &str,
    call_timeout: Duration,
) -> Option<String> {
    let magnet_uri = entry.candidate.magnet_uri.as_deref()?;

    let start = Instant::now();
    let result = tokio::time::timeout(call_timeout, resolver.resolve_link(magnet_uri, Some(hint)))
        .await
        .unwrap_or(Err(DebridError::Timeout));

    match result {
        Ok(Some(url)) if !url.is_empty() => {
            metrics::observe_external("direct_link", "success", start);
            Some(url)
        }
        Ok(_) => {
            metrics::observe_external("direct_link", "success", start);
            metrics::SOFT_FAILURES.with_label_values(&["direct_link"]).inc();
            debug!(hash = ?entry.info_hash(), "Debrid returned no link, falling back to torrent");
            None
        }
        Err(e) => {
            let outcome = if matches!(e, DebridError::Timeout) {
                "timeout"
            } else {
                "failure"
            };
            metrics::observe_external("direct_link", outcome, start);
            metrics::SOFT_FAILURES.with_label_values(&["direct_link"]).inc();
            warn!(hash = ?entry.info_hash(), error = %e, "Direct link resolution failed, falling back to torrent");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockDebrid};

    const HASH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const HASH_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const HASH_C: &str = "cccccccccccccccccccccccccccccccccccccccc";

    fn ctx() -> StreamContext<'static> {
        StreamContext {
            branding: "Magnetar",
            preferred_title: None,
            season: None,
            episode: None,
        }
    }

    fn services(mock: &Arc<MockDebrid>) -> DebridServices {
        DebridServices {
            checker: mock.clone(),
            resolver: mock.clone(),
        }
    }

    fn candidates() -> Vec<TorrentCandidate> {
        vec![
            fixtures::candidate("Movie A 1080p", HASH_A, 10),
            fixtures::candidate("Movie B 720p", HASH_B, 5),
            fixtures::candidate("Movie C 2160p", HASH_C, 3),
        ]
    }

    #[tokio::test]
    async fn test_without_debrid_everything_falls_back() {
        let result = reconcile(candidates(), None, &ctx(), Duration::from_secs(1)).await;
        assert!(result.direct.is_empty());
        assert_eq!(result.fallback.len(), 3);
        assert_eq!(result.fallback[0].info_hash(), Some(HASH_A));
    }

    #[tokio::test]
    async fn test_bulk_failure_sends_all_to_fallback() {
        let mock = Arc::new(MockDebrid::new());
        mock.set_cached(HASH_A, "a.mkv").await;
        mock.set_check_fails(true).await;

        let result = reconcile(
            candidates(),
            Some(&services(&mock)),
            &ctx(),
            Duration::from_secs(1),
        )
        .await;

        assert!(result.direct.is_empty());
        assert_eq!(result.fallback.len(), 3);
        assert_eq!(mock.check_calls(), 1);
        assert_eq!(mock.resolve_calls(), 0);
    }

    #[tokio::test]
    async fn test_cached_candidate_becomes_direct() {
        let mock = Arc::new(MockDebrid::new());
        mock.set_cached(HASH_B, "Movie.B.720p.mkv").await;
        mock.set_link(HASH_B, "https://cdn.example/b.mkv").await;

        let result = reconcile(
            candidates(),
            Some(&services(&mock)),
            &ctx(),
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(result.direct.len(), 1);
        let direct = &result.direct[0];
        assert_eq!(direct.url, "https://cdn.example/b.mkv");
        assert_eq!(direct.name, "Magnetar");
        assert!(direct.title.starts_with("Movie.B.720p.mkv\n"));
        assert!(direct.title.contains("👤 5"));
        assert_eq!(direct.behavior_hints.binge_group, format!("Magnetar|{}", HASH_B));

        let fallback: Vec<_> = result.fallback.iter().filter_map(|e| e.info_hash()).collect();
        assert_eq!(fallback, vec![HASH_A, HASH_C]);
        assert_eq!(mock.check_calls(), 1);
    }

    #[tokio::test]
    async fn test_cached_without_filename_is_fallback() {
        let mock = Arc::new(MockDebrid::new());
        mock.set_cached(HASH_A, "").await;
        mock.set_link(HASH_A, "https://cdn.example/a.mkv").await;

        let result = reconcile(
            candidates(),
            Some(&services(&mock)),
            &ctx(),
            Duration::from_secs(1),
        )
        .await;

        assert!(result.direct.is_empty());
        assert_eq!(mock.resolve_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_resolution_is_appended_to_fallback() {
        let mock = Arc::new(MockDebrid::new());
        mock.set_cached(HASH_A, "a.mkv").await;
        mock.set_cached(HASH_B, "b.mkv").await;
        mock.set_link(HASH_B, "https://cdn.example/b.mkv").await;
        // HASH_A is cached but has no link

        let result = reconcile(
            candidates(),
            Some(&services(&mock)),
            &ctx(),
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(result.direct.len(), 1);
        let fallback: Vec<_> = result.fallback.iter().filter_map(|e| e.info_hash()).collect();
        assert_eq!(fallback, vec![HASH_C, HASH_A]);
        assert_eq!(mock.resolve_calls(), 2);
    }

    #[tokio::test]
    async fn test_resolution_timeout_is_soft() {
        let mock = Arc::new(MockDebrid::new());
        mock.set_cached(HASH_A, "a.mkv").await;
        mock.set_link(HASH_A, "https://cdn.example/a.mkv").await;
        mock.set_resolve_delay(Duration::from_millis(200)).await;

        let result = reconcile(
            candidates(),
            Some(&services(&mock)),
            &ctx(),
            Duration::from_millis(20),
        )
        .await;

        assert!(result.direct.is_empty());
        assert_eq!(result.fallback.len(), 3);
    }

    #[tokio::test]
    async fn test_links_resolve_concurrently() {
        let delay = Duration::from_millis(300);
        let mock = Arc::new(MockDebrid::new());
        for (hash, name) in [(HASH_A, "a"), (HASH_B, "b"), (HASH_C, "c")] {
            mock.set_cached(hash, &format!("{}.mkv", name)).await;
            mock.set_link(hash, &format!("https://cdn.example/{}.mkv", name))
                .await;
        }
        mock.set_resolve_delay(delay).await;

        let start = Instant::now();
        let result = reconcile(
            candidates(),
            Some(&services(&mock)),
            &ctx(),
            Duration::from_secs(5),
        )
        .await;
        let elapsed = start.elapsed();

        assert_eq!(result.direct.len(), 3);
        assert_eq!(mock.resolve_calls(), 3);
        assert!(elapsed < delay * 2, "links resolved sequentially: {:?}", elapsed);
        // Candidate order is kept regardless of completion order
        let urls: Vec<_> = result.direct.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://cdn.example/a.mkv",
                "https://cdn.example/b.mkv",
                "https://cdn.example/c.mkv"
            ]
        );
    }

    #[tokio::test]
    async fn test_candidates_without_magnet_skip_bulk_check() {
        let mock = Arc::new(MockDebrid::new());
        let mut candidate = fixtures::candidate("No Magnet", HASH_A, 1);
        candidate.magnet_uri = None;

        let result = reconcile(
            vec![candidate],
            Some(&services(&mock)),
            &ctx(),
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(result.fallback.len(), 1);
        assert!(!result.fallback[0].had_magnet);
        assert_eq!(mock.check_calls(), 0);
    }

    #[tokio::test]
    async fn test_hint_uses_preferred_title_and_episode() {
        let mock = Arc::new(MockDebrid::new());
        mock.set_cached(HASH_A, "a.mkv").await;
        mock.set_link(HASH_A, "https://cdn.example/a.mkv").await;

        let ctx = StreamContext {
            branding: "Magnetar",
            preferred_title: Some("Show"),
            season: Some(1),
            episode: Some(5),
        };
        reconcile(
            vec![fixtures::candidate("Show.S01.1080p", HASH_A, 10)],
            Some(&services(&mock)),
            &ctx,
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(mock.recorded_hints().await, vec!["Show S01E05".to_string()]);
    }

    #[test]
    fn test_unparseable_magnet_entry() {
        let mut candidate = fixtures::candidate("Broken", HASH_A, 1);
        candidate.magnet_uri = Some("magnet:?xt=urn:btih:nothex".to_string());
        let entry = FallbackEntry::new(candidate);
        assert!(entry.had_magnet);
        assert!(entry.magnet.is_none());
    }
}
