//! Request identifier parsing.
//!
//! Stremio-style requests carry a content kind (`movie` / `series`) and an
//! opaque id. Series episodes are addressed as `tt1234567:season:episode`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content kind of a request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Parse the kind segment of a request path.
    pub fn parse(kind: &str) -> Result<Self, IdentifierError> {
        match kind {
            "movie" => Ok(Self::Movie),
            "series" => Ok(Self::Series),
            other => Err(IdentifierError::UnsupportedKind(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while validating a request identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Unsupported content kind: {0}")]
    UnsupportedKind(String),

    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),
}

/// A validated media identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MediaId {
    /// External id, always `tt` followed by the catalog number.
    pub external_id: String,
    /// Season number (series only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    /// Episode number (series only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    pub kind: MediaKind,
}

impl MediaId {
    /// Parse a `(kind, id)` pair as received from a client.
    pub fn parse(kind: &str, raw_id: &str) -> Result<Self, IdentifierError> {
        let kind = MediaKind::parse(kind)?;
        let malformed = || IdentifierError::MalformedIdentifier(raw_id.to_string());

        if !raw_id.starts_with("tt") {
            return Err(malformed());
        }

        let parts: Vec<&str> = raw_id.split(':').collect();
        let external_id = parts[0];
        let digits = &external_id[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }

        let (season, episode) = match (kind, parts.len()) {
            (_, 1) => (None, None),
            (MediaKind::Series, 3) => {
                let season = parts[1].parse::<u32>().map_err(|_| malformed())?;
                let episode = parts[2].parse::<u32>().map_err(|_| malformed())?;
                (Some(season), Some(episode))
            }
            _ => return Err(malformed()),
        };

        Ok(Self {
            external_id: external_id.to_string(),
            season,
            episode,
            kind,
        })
    }

    /// Key under which resolved streams are cached.
    pub fn cache_key(&self) -> String {
        let fmt = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
        format!(
            "{}:{}:{}",
            self.external_id,
            fmt(self.season),
            fmt(self.episode)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_movie() {
        let id = MediaId::parse("movie", "tt0111161").unwrap();
        assert_eq!(id.external_id, "tt0111161");
        assert_eq!(id.kind, MediaKind::Movie);
        assert!(id.season.is_none());
        assert!(id.episode.is_none());
    }

    #[test]
    fn test_parse_series_episode() {
        for (season, episode) in [(0u32, 0u32), (1, 5), (12, 104), (2024, 1)] {
            let raw = format!("tt1234567:{}:{}", season, episode);
            let id = MediaId::parse("series", &raw).unwrap();
            assert_eq!(
                id,
                MediaId {
                    external_id: "tt1234567".to_string(),
                    season: Some(season),
                    episode: Some(episode),
                    kind: MediaKind::Series,
                }
            );
        }
    }

    #[test]
    fn test_parse_series_without_episode() {
        let id = MediaId::parse("series", "tt0903747").unwrap();
        assert_eq!(id.kind, MediaKind::Series);
        assert!(id.season.is_none());
    }

    #[test]
    fn test_unsupported_kind() {
        let err = MediaId::parse("channel", "tt0111161").unwrap_err();
        assert_eq!(err, IdentifierError::UnsupportedKind("channel".to_string()));
    }

    #[test]
    fn test_malformed_series_ids() {
        let bad = [
            "tt1234567:a:1",
            "tt1234567:1:b",
            "tt1234567:1",
            "tt1234567:1:2:3",
            "tt1234567:-1:2",
            "tt1234567::",
            "nm1234567:1:2",
            "1234567:1:2",
            "tt",
            "tt:1:2",
            "ttabc",
            "ttabc:1:2",
        ];
        for raw in bad {
            let err = MediaId::parse("series", raw).unwrap_err();
            assert!(
                matches!(err, IdentifierError::MalformedIdentifier(_)),
                "expected malformed for {raw}"
            );
        }
    }

    #[test]
    fn test_movie_with_episode_suffix_is_malformed() {
        let err = MediaId::parse("movie", "tt0111161:1:1").unwrap_err();
        assert!(matches!(err, IdentifierError::MalformedIdentifier(_)));
    }

    #[test]
    fn test_cache_key() {
        let movie = MediaId::parse("movie", "tt0111161").unwrap();
        assert_eq!(movie.cache_key(), "tt0111161:-:-");

        let episode = MediaId::parse("series", "tt0903747:3:7").unwrap();
        assert_eq!(episode.cache_key(), "tt0903747:3:7");
    }
}
