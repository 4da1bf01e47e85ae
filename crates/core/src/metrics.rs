//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Stream resolution (outcomes, durations, emitted streams)
//! - Degraded paths taken by the pipeline
//! - External services (indexer, catalog, debrid, trackers)

use std::time::Instant;

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Resolution Metrics
// =============================================================================

/// Resolutions total by result.
pub static RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("magnetar_resolutions_total", "Total stream resolutions"),
        &["result"], // "streams", "empty", "cache_hit", "invalid", "search_failed"
    )
    .unwrap()
});

/// Resolution duration in seconds.
pub static RESOLUTION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "magnetar_resolution_duration_seconds",
            "Duration of a full stream resolution",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["result"],
    )
    .unwrap()
});

/// Streams emitted by variant.
pub static STREAMS_EMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("magnetar_streams_emitted_total", "Total streams returned"),
        &["variant"], // "direct", "torrent"
    )
    .unwrap()
});

/// Candidates returned by the indexer per resolution.
pub static CANDIDATES_FOUND: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "magnetar_candidates_found",
            "Number of torrent candidates found per resolution",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        &[],
    )
    .unwrap()
});

/// Degraded paths taken instead of failing the request.
pub static SOFT_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "magnetar_soft_failures_total",
            "Recovered failures by pipeline stage",
        ),
        &["stage"], // "metadata", "cache_check", "direct_link", "trackers", "magnet", "result_cache"
    )
    .unwrap()
});

/// Persistent result cache lookups.
pub static RESULT_CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "magnetar_result_cache_lookups_total",
            "Result cache lookups by outcome",
        ),
        &["outcome"], // "hit", "miss", "error"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "magnetar_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service"], // "searcher", "metadata", "cache_check", "direct_link", "trackers"
    )
    .unwrap()
});

/// External service requests by result.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "magnetar_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "result"], // result: "success", "failure", "timeout"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record the outcome of one external call started at `start`.
pub fn observe_external(service: &str, result: &str, start: Instant) {
    EXTERNAL_SERVICE_DURATION
        .with_label_values(&[service])
        .observe(start.elapsed().as_secs_f64());
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, result])
        .inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(RESOLUTIONS.clone()),
        Box::new(RESOLUTION_DURATION.clone()),
        Box::new(STREAMS_EMITTED.clone()),
        Box::new(CANDIDATES_FOUND.clone()),
        Box::new(SOFT_FAILURES.clone()),
        Box::new(RESULT_CACHE_LOOKUPS.clone()),
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
