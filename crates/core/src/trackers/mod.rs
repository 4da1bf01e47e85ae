//! Supplementary tracker list.
//!
//! Torrent streams carry the announce endpoints from their own magnet plus a
//! process-wide list fetched once from a public source.

mod http;
mod registry;

pub use http::HttpTrackerSource;
pub use registry::TrackerRegistry;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from fetching the tracker list.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Tracker list request returned status {0}")]
    Status(u16),

    #[error("Tracker fetch failed: {0}")]
    Other(String),
}

/// Something that can produce the list of announce endpoints.
#[async_trait]
pub trait TrackerSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<String>, TrackerError>;
}
