//! Search query construction and candidate retrieval.
//!
//! Turns a [`MediaId`] into indexer queries: a title based query when a
//! catalog lookup succeeds, the raw external id otherwise, with a single
//! season-only retry for episodes that yield nothing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::SearcherConfig;
use crate::external_catalog::{ExternalCatalogError, MetadataLookup, TitleInfo};
use crate::identifier::MediaId;
use crate::metrics;

use super::{SearchError, SearchQuery, Searcher, TorrentCandidate};

/// The queries derived for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// Query sent first.
    pub search: String,
    /// "{title} {year}" when a title lookup succeeded.
    pub base: Option<String>,
    /// Human readable title, used for debrid file hints.
    pub preferred_title: Option<String>,
}

impl QueryPlan {
    /// Build the plan for an identifier and an optional catalog title.
    pub fn new(id: &MediaId, title: Option<&TitleInfo>) -> Self {
        let Some(title) = title else {
            return Self {
                search: id.external_id.clone(),
                base: None,
                preferred_title: None,
            };
        };

        let base = title.base_query();
        let search = match (id.season, id.episode) {
            (Some(season), Some(episode)) => {
                format!("{} S{:02} E{:02}", base, season, episode)
            }
            _ => base.clone(),
        };

        Self {
            search,
            base: Some(base),
            preferred_title: Some(title.title.clone()),
        }
    }

    /// Season-only query, available when a title and season are known.
    pub fn season_query(&self, id: &MediaId) -> Option<String> {
        let base = self.base.as_ref()?;
        let season = id.season?;
        Some(format!("{} S{:02}", base, season))
    }
}

/// Candidates found for a request plus the plan that found them.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    pub plan: QueryPlan,
    /// Query that produced `candidates`.
    pub executed_query: String,
    pub candidates: Vec<TorrentCandidate>,
}

/// Builds queries and runs them against the indexing backend.
pub struct QueryBuilder {
    searcher: Arc<dyn Searcher>,
    metadata: Option<Arc<dyn MetadataLookup>>,
    settings: SearcherConfig,
    call_timeout: Duration,
}

impl QueryBuilder {
    pub fn new(
        searcher: Arc<dyn Searcher>,
        metadata: Option<Arc<dyn MetadataLookup>>,
        settings: SearcherConfig,
        call_timeout: Duration,
    ) -> Self {
        Self {
            searcher,
            metadata,
            settings,
            call_timeout,
        }
    }

    /// Enable title lookups.
    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataLookup>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Find torrent candidates for an identifier.
    ///
    /// Only search failures are returned as errors; a failed title lookup
    /// degrades to searching by external id.
    pub async fn find_candidates(&self, id: &MediaId) -> Result<CandidateSet, SearchError> {
        let title = self.lookup_title(id).await;
        let plan = QueryPlan::new(id, title.as_ref());

        let candidates = self.run_search(id, &plan.search).await?;
        if !candidates.is_empty() {
            return Ok(CandidateSet {
                executed_query: plan.search.clone(),
                plan,
                candidates,
            });
        }

        if id.episode.is_some() {
            if let Some(season_query) = plan.season_query(id) {
                info!(
                    id = %id.external_id,
                    query = %season_query,
                    "No episode results, retrying with season query"
                );
                let candidates = self.run_search(id, &season_query).await?;
                return Ok(CandidateSet {
                    plan,
                    executed_query: season_query,
                    candidates,
                });
            }
        }

        Ok(CandidateSet {
            executed_query: plan.search.clone(),
            plan,
            candidates,
        })
    }

    async fn lookup_title(&self, id: &MediaId) -> Option<TitleInfo> {
        let Some(metadata) = &self.metadata else {
            debug!(id = %id.external_id, "No title lookup configured, searching by id");
            return None;
        };

        let start = Instant::now();
        let result = tokio::time::timeout(self.call_timeout, metadata.lookup(&id.external_id, id.kind))
            .await
            .unwrap_or(Err(ExternalCatalogError::Timeout));

        match result {
            Ok(Some(title)) => {
                metrics::observe_external("metadata", "success", start);
                debug!(id = %id.external_id, title = %title.title, year = ?title.year, "Title lookup succeeded");
                Some(title)
            }
            Ok(None) => {
                metrics::observe_external("metadata", "success", start);
                debug!(id = %id.external_id, "Title lookup found no entry, searching by id");
                None
            }
            Err(e) => {
                let outcome = if matches!(e, ExternalCatalogError::Timeout) {
                    "timeout"
                } else {
                    "failure"
                };
                metrics::observe_external("metadata", outcome, start);
                metrics::SOFT_FAILURES.with_label_values(&["metadata"]).inc();
                warn!(id = %id.external_id, error = %e, "Title lookup failed, searching by id");
                None
            }
        }
    }

    async fn run_search(
        &self,
        id: &MediaId,
        query: &str,
    ) -> Result<Vec<TorrentCandidate>, SearchError> {
        let request = SearchQuery {
            query: query.to_string(),
            kind: id.kind,
            limit: self.settings.result_limit,
            sort_field: self.settings.sort_field.clone(),
            descending: true,
            use_cache: self.settings.use_cache,
        };

        let start = Instant::now();
        let result = tokio::time::timeout(self.call_timeout, self.searcher.search(&request))
            .await
            .unwrap_or(Err(SearchError::Timeout));

        match &result {
            Ok(candidates) => {
                metrics::observe_external("searcher", "success", start);
                debug!(
                    backend = self.searcher.name(),
                    query = %query,
                    results = candidates.len(),
                    "Indexer search returned"
                );
            }
            Err(SearchError::Timeout) => metrics::observe_external("searcher", "timeout", start),
            Err(_) => metrics::observe_external("searcher", "failure", start),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(name: &str, year: Option<u32>) -> TitleInfo {
        TitleInfo {
            title: name.to_string(),
            year,
        }
    }

    #[test]
    fn test_plan_without_title_uses_id() {
        let id = MediaId::parse("series", "tt0111161:1:5").unwrap();
        let plan = QueryPlan::new(&id, None);
        assert_eq!(plan.search, "tt0111161");
        assert!(plan.base.is_none());
        assert!(plan.season_query(&id).is_none());
    }

    #[test]
    fn test_plan_movie_with_title() {
        let id = MediaId::parse("movie", "tt0111161").unwrap();
        let plan = QueryPlan::new(&id, Some(&title("The Shawshank Redemption", Some(1994))));
        assert_eq!(plan.search, "The Shawshank Redemption 1994");
        assert_eq!(
            plan.preferred_title.as_deref(),
            Some("The Shawshank Redemption")
        );
        assert!(plan.season_query(&id).is_none());
    }

    #[test]
    fn test_plan_episode_zero_padded() {
        let id = MediaId::parse("series", "tt0111161:1:5").unwrap();
        let plan = QueryPlan::new(&id, Some(&title("X", Some(2020))));
        assert_eq!(plan.search, "X 2020 S01 E05");
        assert_eq!(plan.season_query(&id).as_deref(), Some("X 2020 S01"));
    }

    #[test]
    fn test_plan_large_numbers_not_truncated() {
        let id = MediaId::parse("series", "tt0111161:123:1045").unwrap();
        let plan = QueryPlan::new(&id, Some(&title("Long Runner", None)));
        assert_eq!(plan.search, "Long Runner S123 E1045");
        assert_eq!(plan.season_query(&id).as_deref(), Some("Long Runner S123"));
    }
}
