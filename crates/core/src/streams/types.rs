//! Output stream types.
//!
//! Serialized shapes follow the Stremio stream object so the list can be
//! returned to clients as-is.

use serde::{Deserialize, Serialize};

/// A playable stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StreamDescriptor {
    /// Direct HTTP link produced by the debrid service.
    Direct(DirectStream),
    /// Plain torrent reference for the client to fetch itself.
    Torrent(TorrentStream),
}

impl StreamDescriptor {
    /// Whether the descriptor satisfies its variant's invariant.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Direct(d) => !d.url.is_empty(),
            Self::Torrent(t) => !t.info_hash.is_empty(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Direct(d) => &d.title,
            Self::Torrent(t) => &t.title,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Direct(_) => "direct",
            Self::Torrent(_) => "torrent",
        }
    }
}

/// Stream served through a debrid direct link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectStream {
    pub name: String,
    pub title: String,
    pub url: String,
    pub behavior_hints: BehaviorHints,
}

/// Client hints attached to direct streams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorHints {
    /// Streams sharing this key are treated as the same release.
    pub binge_group: String,
}

/// Stream served by the client's own torrent engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TorrentStream {
    pub name: String,
    pub title: String,
    pub info_hash: String,
    #[serde(rename = "fileIdx", default, skip_serializing_if = "Option::is_none")]
    pub file_index: Option<u32>,
    /// Announce endpoints, each prefixed with `tracker:`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}
