//! Human readable stream details.

use crate::searcher::TorrentCandidate;

const BYTE_UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Format a byte count with base-1024 units and at most two decimals.
///
/// `format_bytes(0) == "0 Bytes"`, `format_bytes(1536) == "1.5 KB"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, BYTE_UNITS[unit])
}

/// One-line summary of a candidate: size, seeders, resolution, codec,
/// source, languages. Absent fields are skipped.
pub fn format_details(candidate: &TorrentCandidate) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(6);

    if let Some(size) = candidate.size_bytes {
        parts.push(format!("💾 {}", format_bytes(size)));
    }
    parts.push(format!("👤 {}", candidate.seeders));
    parts.push(candidate.resolution.clone());
    if let Some(codec) = candidate.video_codec.as_deref().filter(|c| !c.is_empty()) {
        parts.push(codec.to_string());
    }
    if let Some(source) = candidate.video_source.as_deref().filter(|s| !s.is_empty()) {
        parts.push(source.to_string());
    }
    if !candidate.languages.is_empty() {
        parts.push(format!("🌐 {}", candidate.languages.join(", ")));
    }

    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searcher::UNKNOWN_RESOLUTION;

    fn candidate() -> TorrentCandidate {
        TorrentCandidate {
            title: "Movie.2020.1080p".to_string(),
            magnet_uri: None,
            size_bytes: Some(1536 * 1024 * 1024),
            resolution: "1080p".to_string(),
            seeders: 10,
            peers: 2,
            video_codec: Some("x265".to_string()),
            video_source: Some("BluRay".to_string()),
            languages: vec!["English".to_string(), "French".to_string()],
            files: None,
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(1), "1 Bytes");
        assert_eq!(format_bytes(1023), "1023 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1_048_576), "1 MB");
        assert_eq!(format_bytes(1_288_490_189), "1.2 GB");
        assert_eq!(format_bytes(5 * 1024u64.pow(4)), "5 TB");
    }

    #[test]
    fn test_format_bytes_rounding() {
        // 1.999 MB rounds to 2
        assert_eq!(format_bytes(2_096_103), "2 MB");
        // 1.33 KB
        assert_eq!(format_bytes(1362), "1.33 KB");
    }

    #[test]
    fn test_format_bytes_largest_units() {
        assert_eq!(format_bytes(u64::MAX), "16 EB");
    }

    #[test]
    fn test_format_details_full() {
        assert_eq!(
            format_details(&candidate()),
            "💾 1.5 GB | 👤 10 | 1080p | x265 | BluRay | 🌐 English, French"
        );
    }

    #[test]
    fn test_format_details_minimal() {
        let c = TorrentCandidate {
            size_bytes: None,
            resolution: UNKNOWN_RESOLUTION.to_string(),
            video_codec: None,
            video_source: None,
            languages: vec![],
            ..candidate()
        };
        assert_eq!(format_details(&c), "👤 10 | Unknown");
    }
}
