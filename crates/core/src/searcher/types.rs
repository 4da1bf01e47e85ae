//! Types for the torrent search system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifier::MediaKind;

/// Query parameters for a torrent search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchQuery {
    /// Free-text search query.
    pub query: String,
    /// Content type filter.
    pub kind: MediaKind,
    /// Maximum results to return.
    pub limit: u32,
    /// Field to order results by (backend specific, e.g. "seeders").
    pub sort_field: String,
    /// Sort descending.
    #[serde(default = "default_true")]
    pub descending: bool,
    /// Allow the backend to answer from its own cache.
    #[serde(default = "default_true")]
    pub use_cache: bool,
}

fn default_true() -> bool {
    true
}

/// A torrent search result as returned by the indexing backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TorrentCandidate {
    /// Release title.
    pub title: String,
    /// Magnet URI, when the backend knows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet_uri: Option<String>,
    /// Total size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Resolution label ("1080p", "2160p", ...).
    #[serde(default = "default_resolution")]
    pub resolution: String,
    pub seeders: u32,
    pub peers: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_source: Option<String>,
    /// Audio languages, in backend order.
    #[serde(default)]
    pub languages: Vec<String>,
    /// File list (if provided by the backend).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<TorrentFile>>,
}

/// Label used when the backend does not report a resolution.
pub const UNKNOWN_RESOLUTION: &str = "Unknown";

fn default_resolution() -> String {
    UNKNOWN_RESOLUTION.to_string()
}

/// A file within a torrent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TorrentFile {
    /// Path within the torrent.
    pub path: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// File index inside the torrent, as understood by torrent clients.
    pub index: u32,
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("Search query rejected: {0}")]
    Query(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trait for torrent search backends.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Execute a search. Results never contain zero-seeder torrents.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<TorrentCandidate>, SearchError>;
}
