//! TorBox debrid client.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::DebridConfig;
use crate::searcher::TorrentFile;
use crate::streams::{parse_episode_hint, select_best_file};

use super::{CacheChecker, CacheStatus, DebridError, LinkResolver};

const DEFAULT_BASE_URL: &str = "https://api.torbox.app/v1/api";

/// TorBox API client.
pub struct TorboxClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TorboxClient {
    /// Create a new TorBox client.
    pub fn new(config: DebridConfig) -> Result<Self, DebridError> {
        if config.api_key.is_empty() {
            return Err(DebridError::Rejected("API key is required".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.api_key)
    }

    /// Decode a TorBox envelope, turning `success: false` into an error.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<Option<T>, DebridError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DebridError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| DebridError::ParseError(e.to_string()))?;

        if !envelope.success {
            return Err(DebridError::Rejected(
                envelope
                    .detail
                    .or(envelope.error)
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(envelope.data)
    }

    async fn add_magnet(&self, magnet_uri: &str) -> Result<u64, DebridError> {
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/torrents/createtorrent", self.base_url)),
            )
            .form(&[("magnet", magnet_uri)])
            .send()
            .await?;

        let created: CreatedTorrent = Self::decode(response)
            .await?
            .ok_or_else(|| DebridError::ParseError("createtorrent returned no data".to_string()))?;

        Ok(created.torrent_id)
    }

    async fn list_files(&self, torrent_id: u64) -> Result<Vec<TorrentFile>, DebridError> {
        let response = self
            .authorized(self.client.get(format!("{}/torrents/mylist", self.base_url)))
            .query(&[
                ("id", torrent_id.to_string()),
                ("bypass_cache", "true".to_string()),
            ])
            .send()
            .await?;

        let info: Option<TorrentInfo> = Self::decode(response).await?;
        Ok(info.map(|i| i.into_files()).unwrap_or_default())
    }

    async fn request_download(
        &self,
        torrent_id: u64,
        file_id: u32,
    ) -> Result<Option<String>, DebridError> {
        let response = self
            .client
            .get(format!("{}/torrents/requestdl", self.base_url))
            .query(&[
                ("token", self.api_key.clone()),
                ("torrent_id", torrent_id.to_string()),
                ("file_id", file_id.to_string()),
            ])
            .send()
            .await?;

        let url: Option<String> = Self::decode(response).await?;
        Ok(url.filter(|u| !u.is_empty()))
    }
}

#[async_trait]
impl CacheChecker for TorboxClient {
    async fn check_cached(
        &self,
        info_hashes: &[String],
    ) -> Result<HashMap<String, CacheStatus>, DebridError> {
        if info_hashes.is_empty() {
            return Ok(HashMap::new());
        }

        debug!(hashes = info_hashes.len(), "TorBox cache check");

        let response = self
            .authorized(
                self.client
                    .get(format!("{}/torrents/checkcached", self.base_url)),
            )
            .query(&[
                ("hash", info_hashes.join(",")),
                ("format", "object".to_string()),
                ("list_files", "false".to_string()),
            ])
            .send()
            .await?;

        let cached: Option<HashMap<String, CachedEntry>> = Self::decode(response).await?;
        Ok(into_statuses(cached.unwrap_or_default()))
    }
}

#[async_trait]
impl LinkResolver for TorboxClient {
    async fn resolve_link(
        &self,
        magnet_uri: &str,
        hint: Option<&str>,
    ) -> Result<Option<String>, DebridError> {
        let torrent_id = self.add_magnet(magnet_uri).await?;
        let files = self.list_files(torrent_id).await?;

        let (season, episode) = hint
            .and_then(parse_episode_hint)
            .map(|(s, e)| (Some(s), Some(e)))
            .unwrap_or((None, None));

        let Some(file_id) = select_best_file(Some(&files), season, episode) else {
            debug!(torrent_id, "TorBox torrent has no playable file");
            return Ok(None);
        };

        debug!(torrent_id, file_id, hint = ?hint, "Requesting TorBox download link");
        self.request_download(torrent_id, file_id).await
    }
}

/// Map the service's cached-entry object to per-hash statuses.
fn into_statuses(cached: HashMap<String, CachedEntry>) -> HashMap<String, CacheStatus> {
    cached
        .into_iter()
        .map(|(hash, entry)| {
            (
                hash.to_ascii_lowercase(),
                CacheStatus {
                    is_cached: true,
                    filename: entry.name.filter(|n| !n.is_empty()),
                },
            )
        })
        .collect()
}

// TorBox API response types
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CachedEntry {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedTorrent {
    torrent_id: u64,
}

#[derive(Debug, Deserialize)]
struct TorrentInfo {
    #[serde(default)]
    files: Vec<TorboxFile>,
}

#[derive(Debug, Deserialize)]
struct TorboxFile {
    id: u32,
    name: String,
    size: u64,
}

impl TorrentInfo {
    fn into_files(self) -> Vec<TorrentFile> {
        self.files
            .into_iter()
            .map(|f| TorrentFile {
                path: f.name,
                size_bytes: f.size,
                index: f.id,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        let result = TorboxClient::new(DebridConfig {
            api_key: String::new(),
            base_url: None,
            timeout_secs: 30,
        });
        assert!(matches!(result, Err(DebridError::Rejected(_))));
    }

    #[test]
    fn test_into_statuses_lowercases_and_drops_empty_names() {
        let cached: HashMap<String, CachedEntry> = serde_json::from_value(serde_json::json!({
            "ABCDEF0123456789ABCDEF0123456789ABCDEF01": {"name": "Movie.2020.mkv", "size": 1, "hash": "x"},
            "1111111111111111111111111111111111111111": {"name": ""}
        }))
        .unwrap();

        let statuses = into_statuses(cached);
        let movie = &statuses["abcdef0123456789abcdef0123456789abcdef01"];
        assert!(movie.is_usable());
        assert_eq!(movie.filename.as_deref(), Some("Movie.2020.mkv"));

        let nameless = &statuses["1111111111111111111111111111111111111111"];
        assert!(nameless.is_cached);
        assert!(!nameless.is_usable());
    }

    #[test]
    fn test_envelope_failure_shape() {
        let envelope: Envelope<String> = serde_json::from_value(serde_json::json!({
            "success": false,
            "error": "AUTH_ERROR",
            "detail": "Invalid token",
            "data": null
        }))
        .unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.detail.as_deref(), Some("Invalid token"));
    }

    #[test]
    fn test_torrent_info_files() {
        let info: TorrentInfo = serde_json::from_value(serde_json::json!({
            "id": 9,
            "files": [
                {"id": 0, "name": "Show/Show.S01E01.mkv", "size": 100},
                {"id": 1, "name": "Show/Show.S01E02.mkv", "size": 90}
            ]
        }))
        .unwrap();

        let files = info.into_files();
        assert_eq!(
            select_best_file(Some(&files), Some(1), Some(2)),
            Some(1)
        );
    }
}
