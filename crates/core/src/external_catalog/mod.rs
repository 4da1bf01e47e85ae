//! External catalog integration for title/year lookups.
//!
//! Used to turn a bare external id into a human searchable query. Lookups are
//! best-effort: callers fall back to the raw id when no catalog is configured
//! or the catalog fails.

mod tmdb;
mod types;

pub use tmdb::TmdbClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::identifier::MediaKind;

/// Errors that can occur when interacting with external catalogs.
#[derive(Debug, Error)]
pub enum ExternalCatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),

    /// The lookup did not answer in time.
    #[error("Lookup timed out")]
    Timeout,
}

/// Title lookup by external id.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Find the title and year for an external id.
    ///
    /// `Ok(None)` means the catalog has no entry for the id.
    async fn lookup(
        &self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<Option<TitleInfo>, ExternalCatalogError>;
}
