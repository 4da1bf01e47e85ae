//! Common test utilities for addon API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock collaborators injected, so the HTTP surface can be exercised
//! without a search backend or debrid account.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use magnetar_core::{
    load_config_from_str, Config, StreamResolver, TrackerRegistry,
    testing::{MockDebrid, MockMetadataLookup, MockSearcher, MockStreamCache, MockTrackerSource},
};

/// Re-export fixtures for test convenience
pub use magnetar_core::testing::fixtures;

pub const SUPPLEMENTARY_TRACKER: &str = "udp://supplementary.example:1337/announce";

/// Test fixture wrapping the addon router.
///
/// Every collaborator of the resolver is a controllable mock:
/// - Torrent search (MockSearcher)
/// - Title lookups (MockMetadataLookup)
/// - Debrid cache checks and links (MockDebrid)
/// - Supplementary trackers (MockTrackerSource)
/// - Result cache (MockStreamCache)
pub struct TestFixture {
    pub router: Router,
    pub searcher: Arc<MockSearcher>,
    pub metadata: Arc<MockMetadataLookup>,
    pub debrid: Arc<MockDebrid>,
    pub trackers: Arc<MockTrackerSource>,
    pub cache: Arc<MockStreamCache>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with every collaborator enabled.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let config = test_app_config();

        let searcher = Arc::new(MockSearcher::new());
        let metadata = Arc::new(MockMetadataLookup::new());
        let debrid = Arc::new(MockDebrid::new());
        let trackers = Arc::new(MockTrackerSource::new(vec![
            SUPPLEMENTARY_TRACKER.to_string(),
        ]));
        let cache = Arc::new(MockStreamCache::new());

        let mut resolver = StreamResolver::new(
            Arc::clone(&searcher) as Arc<dyn magnetar_core::Searcher>,
            config.searcher.clone(),
            &config.addon,
        )
        .with_metadata(metadata.clone())
        .with_trackers(Arc::new(TrackerRegistry::new(trackers.clone())))
        .with_cache(cache.clone(), &config.cache);

        if test_config.enable_debrid {
            resolver = resolver.with_debrid(debrid.clone(), debrid.clone());
        }

        let state = Arc::new(magnetar_server::state::AppState::new(
            config,
            Arc::new(resolver),
        ));
        let router = magnetar_server::api::create_router(state);

        Self {
            router,
            searcher,
            metadata,
            debrid,
            trackers,
            cache,
        }
    }

    /// Send a GET request to the test router.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Wire the mock debrid service into the resolver
    pub enable_debrid: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            enable_debrid: true,
        }
    }
}

impl TestConfig {
    /// Create config without a debrid service.
    pub fn without_debrid() -> Self {
        Self {
            enable_debrid: false,
        }
    }
}

fn test_app_config() -> Config {
    load_config_from_str(
        r#"
[server]
host = "127.0.0.1"
port = 7000

[addon]
branding = "TestAddon"
call_timeout_secs = 2

[searcher]
url = "http://localhost:3333/graphql"
result_limit = 25

[debrid]
api_key = "secret-debrid-key"

[trackers]
url = "http://localhost:9999/trackers.txt"
"#,
    )
    .expect("Failed to parse test config")
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
