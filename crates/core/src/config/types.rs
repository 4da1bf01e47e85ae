use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub addon: AddonConfig,
    pub searcher: SearcherConfig,
    #[serde(default)]
    pub metadata: Option<MetadataConfig>,
    #[serde(default)]
    pub debrid: Option<DebridConfig>,
    #[serde(default)]
    pub trackers: Option<TrackersConfig>,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    7000
}

/// Addon presentation and per-call limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddonConfig {
    /// Name shown on every stream (default: "Magnetar")
    #[serde(default = "default_branding")]
    pub branding: String,
    /// Upper bound for any single external call, in seconds (default: 10)
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u32,
}

impl Default for AddonConfig {
    fn default() -> Self {
        Self {
            branding: default_branding(),
            call_timeout_secs: default_call_timeout(),
        }
    }
}

fn default_branding() -> String {
    "Magnetar".to_string()
}

fn default_call_timeout() -> u32 {
    10
}

/// GraphQL indexing backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearcherConfig {
    /// GraphQL endpoint (e.g., "http://localhost:3333/graphql")
    pub url: String,
    /// HTTP client timeout in seconds, at most `addon.call_timeout_secs` (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Maximum results per search (default: 50)
    #[serde(default = "default_result_limit")]
    pub result_limit: u32,
    /// Ordering field understood by the backend (default: "seeders")
    #[serde(default = "default_sort_field")]
    pub sort_field: String,
    /// Let the backend serve cached search results (default: true)
    #[serde(default = "default_true")]
    pub use_cache: bool,
}

fn default_timeout() -> u32 {
    default_call_timeout()
}

fn default_result_limit() -> u32 {
    50
}

fn default_sort_field() -> String {
    "seeders".to_string()
}

fn default_true() -> bool {
    true
}

/// TMDB title lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// TMDB API key. An empty key disables lookups.
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Debrid service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebridConfig {
    /// Debrid API key
    pub api_key: String,
    /// Base URL (default: https://api.torbox.app/v1/api)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// HTTP client timeout in seconds, at most `addon.call_timeout_secs` (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Supplementary tracker list configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackersConfig {
    /// URL of a newline separated announce list
    pub url: String,
}

/// Persistent stream cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    /// Lifetime of non-empty results in seconds (default: 6h)
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// Lifetime of empty results in seconds (default: 10m)
    #[serde(default = "default_empty_ttl")]
    pub empty_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            ttl_secs: default_ttl(),
            empty_ttl_secs: default_empty_ttl(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("magnetar.db")
}

fn default_ttl() -> u64 {
    6 * 60 * 60
}

fn default_empty_ttl() -> u64 {
    10 * 60
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub addon: AddonConfig,
    pub searcher: SearcherConfig,
    pub metadata_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debrid: Option<SanitizedDebridConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trackers: Option<TrackersConfig>,
    pub cache: CacheConfig,
}

/// Sanitized debrid config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDebridConfig {
    pub base_url: Option<String>,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            addon: config.addon.clone(),
            searcher: config.searcher.clone(),
            metadata_configured: config
                .metadata
                .as_ref()
                .map(|m| !m.api_key.is_empty())
                .unwrap_or(false),
            debrid: config.debrid.as_ref().map(|d| SanitizedDebridConfig {
                base_url: d.base_url.clone(),
                api_key_configured: !d.api_key.is_empty(),
                timeout_secs: d.timeout_secs,
            }),
            trackers: config.trackers.clone(),
            cache: config.cache.clone(),
        }
    }
}
