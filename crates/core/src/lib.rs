pub mod cache;
pub mod config;
pub mod debrid;
pub mod external_catalog;
pub mod identifier;
pub mod magnet;
pub mod metrics;
pub mod searcher;
pub mod streams;
pub mod testing;
pub mod trackers;

pub use cache::{CacheError, SqliteStreamCache, StreamCache};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use debrid::{CacheChecker, CacheStatus, DebridError, LinkResolver, TorboxClient};
pub use external_catalog::{ExternalCatalogError, MetadataLookup, TitleInfo, TmdbClient};
pub use identifier::{IdentifierError, MediaId, MediaKind};
pub use magnet::{build_magnet, parse_magnet, ParsedMagnet};
pub use searcher::{GraphqlSearcher, SearchError, SearchQuery, Searcher, TorrentCandidate};
pub use streams::{ResolveError, StreamDescriptor, StreamResolver};
pub use trackers::{HttpTrackerSource, TrackerError, TrackerRegistry, TrackerSource};
