//! Best-file selection inside a torrent.
//!
//! Picks the file a player should open: the largest video matching the
//! requested episode, else the largest video, else the only file.

use regex_lite::Regex;

use crate::searcher::TorrentFile;

/// Extensions considered playable.
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mkv", "mp4", "avi", "mov", "wmv", "flv"];

/// Characters that may surround an episode marker. Path separators count as
/// boundaries so markers at the start of a nested file name still match.
const SEPARATORS: &str = r"[ ._\-/\\]";

/// Select the best file index for a season/episode target.
///
/// Returns the `index` of the chosen file, or `None` when nothing sensible
/// can be picked (empty listing, several non-video files).
pub fn select_best_file(
    files: Option<&[TorrentFile]>,
    season: Option<u32>,
    episode: Option<u32>,
) -> Option<u32> {
    let files = files?;
    if files.is_empty() {
        return None;
    }

    let patterns = match (season, episode) {
        (Some(s), Some(e)) => episode_patterns(s, e),
        _ => Vec::new(),
    };

    let mut best_match: Option<&TorrentFile> = None;
    let mut largest_video: Option<&TorrentFile> = None;

    for file in files.iter().filter(|f| is_video(&f.path)) {
        if largest_video.map_or(true, |l| file.size_bytes > l.size_bytes) {
            largest_video = Some(file);
        }
        if patterns.iter().any(|re| re.is_match(&file.path))
            && best_match.map_or(true, |b| file.size_bytes > b.size_bytes)
        {
            best_match = Some(file);
        }
    }

    best_match
        .or(largest_video)
        .or_else(|| match files {
            [only] => Some(only),
            _ => None,
        })
        .map(|f| f.index)
}

/// Extract a season/episode target from a free-text hint ("Show S01E05").
pub fn parse_episode_hint(hint: &str) -> Option<(u32, u32)> {
    let re = Regex::new(r"(?i)\bS(\d{1,4})\s?E(\d{1,4})\b").ok()?;
    let caps = re.captures(hint)?;
    let season = caps.get(1)?.as_str().parse().ok()?;
    let episode = caps.get(2)?.as_str().parse().ok()?;
    Some((season, episode))
}

/// Whether a path has a recognized video extension.
pub fn is_video(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(_, ext)| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Scene naming conventions for one episode, most specific first.
fn episode_patterns(season: u32, episode: u32) -> Vec<Regex> {
    let markers = [
        format!("S{:02}E{:02}", season, episode),
        format!("S{}E{:02}", season, episode),
        format!("S{:02}E{}", season, episode),
        format!("S{}E{}", season, episode),
        format!("{}x{:02}", season, episode),
        format!("{}x{}", season, episode),
    ];

    let mut seen: Vec<String> = Vec::new();
    markers
        .into_iter()
        .filter(|m| {
            if seen.contains(m) {
                false
            } else {
                seen.push(m.clone());
                true
            }
        })
        .filter_map(|m| {
            Regex::new(&format!(
                r"(?i)(?:^|{sep}){marker}(?:{sep}|$)",
                sep = SEPARATORS,
                marker = m
            ))
            .ok()
        })
        .collect()
}
