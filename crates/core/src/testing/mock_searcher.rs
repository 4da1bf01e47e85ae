//! Mock searcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::searcher::{SearchError, SearchQuery, Searcher, TorrentCandidate};

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    /// The query that was searched.
    pub query: SearchQuery,
    /// When the search was made.
    pub timestamp: Instant,
}

/// Mock implementation of the Searcher trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable results, globally or per exact query string
/// - Track search queries for assertions
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// use magnetar_core::testing::{MockSearcher, fixtures};
///
/// let searcher = MockSearcher::new();
/// searcher.set_query_results("X 2020 S01", vec![
///     fixtures::candidate("X.S01.1080p", fixtures::HASH_A, 10),
/// ]).await;
///
/// // Every other query returns the default (empty) results
/// let searches = searcher.recorded_searches().await;
/// ```
#[derive(Debug)]
pub struct MockSearcher {
    /// Results for queries without a specific entry.
    results: Arc<RwLock<Vec<TorrentCandidate>>>,
    /// Results for exact query strings.
    query_results: Arc<RwLock<HashMap<String, Vec<TorrentCandidate>>>>,
    /// Recorded search queries.
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<SearchError>>>,
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearcher {
    /// Create a new mock searcher with empty results.
    pub fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(Vec::new())),
            query_results: Arc::new(RwLock::new(HashMap::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the results returned for any query without a specific entry.
    pub async fn set_results(&self, results: Vec<TorrentCandidate>) {
        *self.results.write().await = results;
    }

    /// Set the results returned for one exact query string.
    pub async fn set_query_results(&self, query: &str, results: Vec<TorrentCandidate>) {
        self.query_results
            .write()
            .await
            .insert(query.to_string(), results);
    }

    /// Get recorded search queries.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// Query strings searched so far, in order.
    pub async fn searched_queries(&self) -> Vec<String> {
        self.searches
            .read()
            .await
            .iter()
            .map(|s| s.query.query.clone())
            .collect()
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<TorrentCandidate>, SearchError> {
        self.searches.write().await.push(RecordedSearch {
            query: query.clone(),
            timestamp: Instant::now(),
        });

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let candidates = match self.query_results.read().await.get(&query.query) {
            Some(results) => results.clone(),
            None => self.results.read().await.clone(),
        };

        Ok(candidates
            .into_iter()
            .filter(|c| c.seeders > 0)
            .take(query.limit as usize)
            .collect())
    }
}
