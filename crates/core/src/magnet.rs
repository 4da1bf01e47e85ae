//! Magnet URI parsing.
//!
//! Only the pieces the stream pipeline needs are extracted: the BitTorrent
//! v1 info hash (`xt=urn:btih:<40 hex>`) and the announce endpoints (`tr`).

use serde::{Deserialize, Serialize};
use url::Url;

const MAGNET_SCHEME: &str = "magnet";
const MAGNET_PREFIX: &str = "magnet:?";
const BTIH_PREFIX: &str = "urn:btih:";

/// Identity and announce endpoints extracted from a magnet URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedMagnet {
    /// Lowercase 40 character hex info hash.
    pub info_hash: String,
    /// Distinct, non-empty tracker URLs in first-seen order.
    pub trackers: Vec<String>,
}

/// Parse a magnet URI.
///
/// Returns `None` when the input is absent, is not a magnet URI or carries
/// no hex BTIH topic. Never fails otherwise.
pub fn parse_magnet(uri: Option<&str>) -> Option<ParsedMagnet> {
    let url = Url::parse(uri?).ok()?;
    if url.scheme() != MAGNET_SCHEME {
        return None;
    }

    let mut info_hash = None;
    let mut trackers: Vec<String> = Vec::new();

    for (key, value) in url.query_pairs() {
        match &*key {
            "xt" if info_hash.is_none() => info_hash = extract_btih(&value),
            "tr" => {
                if !value.is_empty() && !trackers.iter().any(|t| t.as_str() == &*value) {
                    trackers.push(value.into_owned());
                }
            }
            _ => {}
        }
    }

    Some(ParsedMagnet {
        info_hash: info_hash?,
        trackers,
    })
}

/// Build a magnet URI from an info hash and tracker list.
pub fn build_magnet(info_hash: &str, trackers: &[String]) -> String {
    let mut uri = format!("{}xt={}{}", MAGNET_PREFIX, BTIH_PREFIX, info_hash);
    for tracker in trackers {
        uri.push_str("&tr=");
        uri.push_str(&urlencoding::encode(tracker));
    }
    uri
}

/// Extract a lowercase hex info hash from an `xt` value.
fn extract_btih(value: &str) -> Option<String> {
    let prefix = value.get(..BTIH_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(BTIH_PREFIX) {
        return None;
    }
    let hash = &value[BTIH_PREFIX.len()..];
    if hash.len() == 40 && hash.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(hash.to_ascii_lowercase())
    } else {
        None
    }
}
