//! GraphQL indexing backend (bitmagnet-compatible).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::SearcherConfig;
use crate::identifier::MediaKind;

use super::{SearchError, SearchQuery, Searcher, TorrentCandidate, TorrentFile, UNKNOWN_RESOLUTION};

const SEARCH_QUERY: &str = r#"
query TorrentContentSearch($input: TorrentContentSearchQueryInput!) {
  torrentContent {
    search(input: $input) {
      items {
        title
        seeders
        leechers
        videoResolution
        videoCodec
        videoSource
        languages { id name }
        torrent {
          name
          size
          magnetUri
          files { index path size }
        }
      }
    }
  }
}
"#;

/// GraphQL search backend implementation.
pub struct GraphqlSearcher {
    client: Client,
    config: SearcherConfig,
}

impl GraphqlSearcher {
    /// Create a new GraphqlSearcher with the given configuration.
    pub fn new(config: SearcherConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| SearchError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Build the request body for a search.
    fn build_request(&self, query: &SearchQuery) -> GraphqlRequest {
        GraphqlRequest {
            query: SEARCH_QUERY,
            variables: SearchVariables {
                input: SearchInput {
                    query_string: query.query.clone(),
                    limit: query.limit,
                    cached: query.use_cache,
                    order_by: vec![OrderBy {
                        field: query.sort_field.clone(),
                        descending: query.descending,
                    }],
                    facets: Facets {
                        content_type: ContentTypeFacet {
                            filter: vec![content_type_filter(query.kind)],
                        },
                    },
                },
            },
        }
    }
}

#[async_trait]
impl Searcher for GraphqlSearcher {
    fn name(&self) -> &str {
        "graphql"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<TorrentCandidate>, SearchError> {
        let start = Instant::now();
        debug!(query = %query.query, kind = %query.kind, "Searching indexing backend");

        let response = self
            .client
            .post(&self.config.url)
            .json(&self.build_request(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout
                } else if e.is_connect() {
                    SearchError::ConnectionFailed(e.to_string())
                } else {
                    SearchError::ApiError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ApiError(format!("Failed to parse response: {}", e)))?;

        let candidates = into_candidates(body)?;

        debug!(
            results = candidates.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Search complete"
        );

        Ok(candidates)
    }
}

/// Map a content kind to the backend's content type facet value.
fn content_type_filter(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "movie",
        MediaKind::Series => "tv_show",
    }
}

/// Convert a GraphQL response into candidates, dropping unseeded torrents.
fn into_candidates(body: GraphqlResponse) -> Result<Vec<TorrentCandidate>, SearchError> {
    if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(SearchError::Query(messages.join("; ")));
    }

    let data = body
        .data
        .ok_or_else(|| SearchError::ApiError("Response contained no data".to_string()))?;

    Ok(data
        .torrent_content
        .search
        .items
        .into_iter()
        .filter(|item| item.seeders.unwrap_or(0) > 0)
        .map(|item| {
            let torrent = item.torrent;
            TorrentCandidate {
                title: item
                    .title
                    .filter(|t| !t.is_empty())
                    .or_else(|| torrent.as_ref().map(|t| t.name.clone()))
                    .unwrap_or_default(),
                magnet_uri: torrent.as_ref().and_then(|t| t.magnet_uri.clone()),
                size_bytes: torrent
                    .as_ref()
                    .and_then(|t| t.size)
                    .map(|s| s.max(0) as u64),
                resolution: item
                    .video_resolution
                    .map(|r| r.trim_start_matches('V').to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| UNKNOWN_RESOLUTION.to_string()),
                seeders: item.seeders.unwrap_or(0).max(0) as u32,
                peers: item.leechers.unwrap_or(0).max(0) as u32,
                video_codec: item.video_codec,
                video_source: item.video_source,
                languages: item.languages.into_iter().map(|l| l.name).collect(),
                files: torrent.and_then(|t| t.files).map(|files| {
                    files
                        .into_iter()
                        .map(|f| TorrentFile {
                            path: f.path,
                            size_bytes: f.size.max(0) as u64,
                            index: f.index,
                        })
                        .collect()
                }),
            }
        })
        .collect())
}

// GraphQL request types
#[derive(Debug, Serialize)]
struct GraphqlRequest {
    query: &'static str,
    variables: SearchVariables,
}

#[derive(Debug, Serialize)]
struct SearchVariables {
    input: SearchInput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchInput {
    query_string: String,
    limit: u32,
    cached: bool,
    order_by: Vec<OrderBy>,
    facets: Facets,
}

#[derive(Debug, Serialize)]
struct OrderBy {
    field: String,
    descending: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Facets {
    content_type: ContentTypeFacet,
}

#[derive(Debug, Serialize)]
struct ContentTypeFacet {
    filter: Vec<&'static str>,
}

// GraphQL response types
#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<ResponseData>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    torrent_content: TorrentContent,
}

#[derive(Debug, Deserialize)]
struct TorrentContent {
    search: SearchItems,
}

#[derive(Debug, Deserialize)]
struct SearchItems {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    title: Option<String>,
    seeders: Option<i64>,
    leechers: Option<i64>,
    video_resolution: Option<String>,
    video_codec: Option<String>,
    video_source: Option<String>,
    #[serde(default)]
    languages: Vec<Language>,
    torrent: Option<TorrentInfo>,
}

#[derive(Debug, Deserialize)]
struct Language {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TorrentInfo {
    name: String,
    size: Option<i64>,
    magnet_uri: Option<String>,
    files: Option<Vec<FileInfo>>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    index: u32,
    path: String,
    size: i64,
}
