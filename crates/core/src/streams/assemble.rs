//! Final stream list assembly.

use std::collections::HashSet;

use tracing::debug;

use crate::metrics;

use super::file_selector::select_best_file;
use super::format::format_details;
use super::reconciler::FallbackEntry;
use super::types::{DirectStream, StreamDescriptor, TorrentStream};
use super::StreamContext;

const TRACKER_PREFIX: &str = "tracker:";

/// Build a torrent stream for one fallback entry.
///
/// Returns `None` when the entry cannot identify its torrent: a magnet that
/// was present but unparseable, or no magnet at all.
pub fn torrent_stream(
    entry: &FallbackEntry,
    supplementary_trackers: &[String],
    ctx: &StreamContext<'_>,
) -> Option<TorrentStream> {
    let candidate = &entry.candidate;

    if entry.had_magnet && entry.magnet.is_none() {
        metrics::SOFT_FAILURES.with_label_values(&["magnet"]).inc();
        debug!(title = %candidate.title, "Dropping candidate with unparseable magnet");
        return None;
    }

    // A torrent stream is addressed by its hash
    let magnet = entry.magnet.as_ref()?;

    let file_index = select_best_file(candidate.files.as_deref(), ctx.season, ctx.episode);
    let details = format_details(candidate);

    let label = if candidate.title.is_empty() {
        magnet.info_hash.as_str()
    } else {
        candidate.title.as_str()
    };

    let mut trackers: Vec<&str> = Vec::new();
    for tracker in magnet
        .trackers
        .iter()
        .chain(supplementary_trackers)
        .map(String::as_str)
        .filter(|t| !t.is_empty())
    {
        if !trackers.contains(&tracker) {
            trackers.push(tracker);
        }
    }
    let sources = if trackers.is_empty() {
        None
    } else {
        Some(
            trackers
                .into_iter()
                .map(|t| format!("{}{}", TRACKER_PREFIX, t))
                .collect(),
        )
    };

    Some(TorrentStream {
        name: format!("{}\n{}", ctx.branding, candidate.resolution),
        title: format!("{}\n{}", label, details),
        info_hash: magnet.info_hash.clone(),
        file_index,
        sources,
    })
}

/// Build torrent streams for all fallback entries, keeping the first stream
/// per info hash.
pub fn torrent_streams(
    fallback: &[FallbackEntry],
    supplementary_trackers: &[String],
    ctx: &StreamContext<'_>,
) -> Vec<TorrentStream> {
    let mut seen: HashSet<String> = HashSet::new();
    fallback
        .iter()
        .filter_map(|entry| torrent_stream(entry, supplementary_trackers, ctx))
        .filter(|stream| seen.insert(stream.info_hash.clone()))
        .collect()
}

/// Direct streams first, then deduplicated torrent streams, with every
/// descriptor checked against its variant invariant.
pub fn assemble(
    direct: Vec<DirectStream>,
    fallback: &[FallbackEntry],
    supplementary_trackers: &[String],
    ctx: &StreamContext<'_>,
) -> Vec<StreamDescriptor> {
    let torrents = torrent_streams(fallback, supplementary_trackers, ctx);

    direct
        .into_iter()
        .map(StreamDescriptor::Direct)
        .chain(torrents.into_iter().map(StreamDescriptor::Torrent))
        .filter(StreamDescriptor::is_valid)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searcher::TorrentFile;
    use crate::streams::BehaviorHints;
    use crate::testing::fixtures;

    const HASH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const HASH_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn ctx() -> StreamContext<'static> {
        StreamContext {
            branding: "Magnetar",
            preferred_title: None,
            season: Some(1),
            episode: Some(2),
        }
    }

    #[test]
    fn test_torrent_stream_fields() {
        let mut candidate = fixtures::candidate_with_trackers(
            "Show.S01.1080p",
            HASH_A,
            10,
            &["udp://own:1/announce"],
        );
        candidate.files = Some(vec![
            TorrentFile {
                path: "Show.S01E01.mkv".to_string(),
                size_bytes: 900,
                index: 0,
            },
            TorrentFile {
                path: "Show.S01E02.mkv".to_string(),
                size_bytes: 500,
                index: 1,
            },
        ]);

        let stream = torrent_stream(
            &FallbackEntry::new(candidate),
            &[
                "udp://extra:2/announce".to_string(),
                "udp://own:1/announce".to_string(),
            ],
            &ctx(),
        )
        .unwrap();

        assert_eq!(stream.name, "Magnetar\n1080p");
        assert!(stream.title.starts_with("Show.S01.1080p\n"));
        assert!(stream.title.contains("👤 10"));
        assert_eq!(stream.info_hash, HASH_A);
        assert_eq!(stream.file_index, Some(1));
        assert_eq!(
            stream.sources,
            Some(vec![
                "tracker:udp://own:1/announce".to_string(),
                "tracker:udp://extra:2/announce".to_string(),
            ])
        );
    }

    #[test]
    fn test_sources_omitted_when_empty() {
        let entry = FallbackEntry::new(fixtures::candidate("Movie", HASH_A, 1));
        let stream = torrent_stream(&entry, &[], &ctx()).unwrap();
        assert_eq!(stream.sources, None);
        assert_eq!(stream.file_index, None);
    }

    #[test]
    fn test_empty_title_uses_hash() {
        let entry = FallbackEntry::new(fixtures::candidate("", HASH_A, 1));
        let stream = torrent_stream(&entry, &[], &ctx()).unwrap();
        assert!(stream.title.starts_with(&format!("{}\n", HASH_A)));
    }

    #[test]
    fn test_unparseable_or_missing_magnet_is_dropped() {
        let mut broken = fixtures::candidate("Broken", HASH_A, 1);
        broken.magnet_uri = Some("magnet:?dn=no-hash".to_string());
        assert!(torrent_stream(&FallbackEntry::new(broken), &[], &ctx()).is_none());

        let mut absent = fixtures::candidate("Absent", HASH_A, 1);
        absent.magnet_uri = None;
        assert!(torrent_stream(&FallbackEntry::new(absent), &[], &ctx()).is_none());
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let fallback = vec![
            FallbackEntry::new(fixtures::candidate("First", HASH_A, 5)),
            FallbackEntry::new(fixtures::candidate("Other", HASH_B, 5)),
            FallbackEntry::new(fixtures::candidate("Re-added", HASH_A, 50)),
        ];

        let streams = torrent_streams(&fallback, &[], &ctx());
        assert_eq!(streams.len(), 2);
        assert!(streams[0].title.starts_with("First\n"));
        assert_eq!(streams[1].info_hash, HASH_B);
    }

    #[test]
    fn test_assemble_orders_direct_first_and_filters_invalid() {
        let direct = vec![
            DirectStream {
                name: "Magnetar".to_string(),
                title: "b.mkv\n👤 1".to_string(),
                url: "https://cdn.example/b.mkv".to_string(),
                behavior_hints: BehaviorHints {
                    binge_group: format!("Magnetar|{}", HASH_B),
                },
            },
            DirectStream {
                name: "Magnetar".to_string(),
                title: "broken".to_string(),
                url: String::new(),
                behavior_hints: BehaviorHints {
                    binge_group: "Magnetar|x".to_string(),
                },
            },
        ];
        let fallback = vec![FallbackEntry::new(fixtures::candidate("A", HASH_A, 5))];

        let streams = assemble(direct, &fallback, &[], &ctx());
        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].variant_name(), "direct");
        assert_eq!(streams[1].variant_name(), "torrent");
    }
}
