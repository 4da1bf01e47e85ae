//! Debrid service integration.
//!
//! A debrid service keeps popular torrents pre-downloaded and serves their
//! files over HTTP. Two capabilities are used: a bulk "is this hash cached"
//! check and per-torrent direct link generation.

mod torbox;

pub use torbox::TorboxClient;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cache state of one info hash on the debrid service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheStatus {
    pub is_cached: bool,
    /// Name the service reports for the cached torrent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl CacheStatus {
    /// Cached with a usable name.
    pub fn is_usable(&self) -> bool {
        self.is_cached && self.filename.as_deref().is_some_and(|f| !f.is_empty())
    }
}

/// Errors from debrid calls.
#[derive(Debug, Error)]
pub enum DebridError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Debrid service rejected the request: {0}")]
    Rejected(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Debrid call timed out")]
    Timeout,
}

/// Bulk cache-status lookup.
#[async_trait]
pub trait CacheChecker: Send + Sync {
    /// Look up the cache state of many hashes in one call.
    ///
    /// Hashes missing from the returned map are not cached.
    async fn check_cached(
        &self,
        info_hashes: &[String],
    ) -> Result<HashMap<String, CacheStatus>, DebridError>;
}

/// Direct link generation for a cached torrent.
#[async_trait]
pub trait LinkResolver: Send + Sync {
    /// Produce a direct download URL for the file best matching `hint`.
    ///
    /// `Ok(None)` means the service answered but had nothing playable.
    async fn resolve_link(
        &self,
        magnet_uri: &str,
        hint: Option<&str>,
    ) -> Result<Option<String>, DebridError>;
}
