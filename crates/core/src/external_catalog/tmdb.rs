//! TMDB (The Movie Database) API client.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::MetadataConfig;
use crate::identifier::MediaKind;

use super::{ExternalCatalogError, MetadataLookup, TitleInfo};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: MetadataConfig) -> Result<Self, ExternalCatalogError> {
        if config.api_key.is_empty() {
            return Err(ExternalCatalogError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    /// Resolve an IMDb id through TMDB's `find` endpoint.
    async fn find(&self, imdb_id: &str) -> Result<TmdbFindResponse, ExternalCatalogError> {
        let url = format!("{}/find/{}", self.base_url, urlencoding::encode(imdb_id));

        debug!("TMDB find: id={}", imdb_id);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("external_source", "imdb_id"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            return Err(ExternalCatalogError::NotConfigured(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if status == 429 {
            return Err(ExternalCatalogError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExternalCatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!("Failed to parse find response: {}", e))
        })
    }
}

#[async_trait]
impl MetadataLookup for TmdbClient {
    async fn lookup(
        &self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<Option<TitleInfo>, ExternalCatalogError> {
        let found = self.find(external_id).await?;
        Ok(found.into_title(kind))
    }
}

// ============================================================================
// TMDB API Response Types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbFindResponse {
    #[serde(default)]
    movie_results: Vec<TmdbMovieResult>,
    #[serde(default)]
    tv_results: Vec<TmdbTvResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    title: String,
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvResult {
    name: String,
    first_air_date: Option<String>,
}

impl TmdbFindResponse {
    /// Pick the first result matching the requested kind.
    fn into_title(self, kind: MediaKind) -> Option<TitleInfo> {
        match kind {
            MediaKind::Movie => self
                .movie_results
                .into_iter()
                .next()
                .map(|m| TitleInfo::from_date(m.title, m.release_date.as_deref())),
            MediaKind::Series => self
                .tv_results
                .into_iter()
                .next()
                .map(|t| TitleInfo::from_date(t.name, t.first_air_date.as_deref())),
        }
        .filter(|info| !info.title.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_response() -> TmdbFindResponse {
        serde_json::from_value(serde_json::json!({
            "movie_results": [
                {"id": 278, "title": "The Shawshank Redemption", "release_date": "1994-09-23"}
            ],
            "tv_results": [
                {"id": 1396, "name": "Breaking Bad", "first_air_date": "2008-01-20"}
            ],
            "person_results": []
        }))
        .unwrap()
    }

    #[test]
    fn test_find_movie_title() {
        let info = find_response().into_title(MediaKind::Movie).unwrap();
        assert_eq!(info.title, "The Shawshank Redemption");
        assert_eq!(info.year, Some(1994));
    }

    #[test]
    fn test_find_series_title() {
        let info = find_response().into_title(MediaKind::Series).unwrap();
        assert_eq!(info.title, "Breaking Bad");
        assert_eq!(info.year, Some(2008));
    }

    #[test]
    fn test_find_no_match() {
        let empty: TmdbFindResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.into_title(MediaKind::Movie).is_none());
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = TmdbClient::new(MetadataConfig {
            api_key: String::new(),
            base_url: None,
        });
        assert!(matches!(result, Err(ExternalCatalogError::NotConfigured(_))));
    }
}
