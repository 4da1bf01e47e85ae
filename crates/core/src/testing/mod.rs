//! Testing utilities and mock implementations.
//!
//! Every external collaborator of the resolver has a mock here, so the
//! whole pipeline can be exercised without an indexer, catalog, debrid
//! service or network.
//!
//! # Example
//!
//! ```rust,ignore
//! use magnetar_core::testing::{fixtures, MockDebrid, MockSearcher};
//!
//! let searcher = Arc::new(MockSearcher::new());
//! searcher.set_results(vec![fixtures::candidate("Movie", fixtures::HASH_A, 10)]).await;
//!
//! let debrid = Arc::new(MockDebrid::new());
//! debrid.set_cached(fixtures::HASH_A, "Movie.mkv").await;
//! debrid.set_link(fixtures::HASH_A, "https://cdn.example/movie.mkv").await;
//! ```

mod mock_debrid;
mod mock_external_catalog;
mod mock_searcher;
mod mock_stream_cache;
mod mock_trackers;

pub use mock_debrid::MockDebrid;
pub use mock_external_catalog::MockMetadataLookup;
pub use mock_searcher::{MockSearcher, RecordedSearch};
pub use mock_stream_cache::MockStreamCache;
pub use mock_trackers::MockTrackerSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::SearcherConfig;
    use crate::magnet::build_magnet;
    use crate::searcher::{TorrentCandidate, TorrentFile};

    pub const HASH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    pub const HASH_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    pub const HASH_C: &str = "cccccccccccccccccccccccccccccccccccccccc";

    /// Create a test torrent candidate with a trackerless magnet.
    pub fn candidate(title: &str, info_hash: &str, seeders: u32) -> TorrentCandidate {
        candidate_with_trackers(title, info_hash, seeders, &[])
    }

    /// Create a test torrent candidate whose magnet carries `trackers`.
    pub fn candidate_with_trackers(
        title: &str,
        info_hash: &str,
        seeders: u32,
        trackers: &[&str],
    ) -> TorrentCandidate {
        let trackers: Vec<String> = trackers.iter().map(|t| t.to_string()).collect();
        TorrentCandidate {
            title: title.to_string(),
            magnet_uri: Some(build_magnet(info_hash, &trackers)),
            size_bytes: Some(1024 * 1024 * 1024 * 2), // 2 GB
            resolution: "1080p".to_string(),
            seeders,
            peers: 3,
            video_codec: Some("x264".to_string()),
            video_source: Some("WEB-DL".to_string()),
            languages: vec!["English".to_string()],
            files: None,
        }
    }

    /// Create a season pack candidate with one file per episode.
    pub fn season_pack(title: &str, info_hash: &str, season: u32, episodes: u32) -> TorrentCandidate {
        let mut candidate = candidate(title, info_hash, 25);
        candidate.files = Some(
            (1..=episodes)
                .map(|e| TorrentFile {
                    path: format!("{}/{}.S{:02}E{:02}.mkv", title, title, season, e),
                    size_bytes: 1_000_000_000 + e as u64,
                    index: e - 1,
                })
                .collect(),
        );
        candidate
    }

    /// Searcher settings pointing at a local backend.
    pub fn searcher_config() -> SearcherConfig {
        SearcherConfig {
            url: "http://localhost:3333/graphql".to_string(),
            timeout_secs: 30,
            result_limit: 50,
            sort_field: "seeders".to_string(),
            use_cache: true,
        }
    }
}
