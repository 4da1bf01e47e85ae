use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use magnetar_core::{
    load_config, validate_config, GraphqlSearcher, HttpTrackerSource, Searcher, SqliteStreamCache,
    StreamCache, StreamResolver, TmdbClient, TorboxClient, TrackerRegistry,
};

use magnetar_server::api::create_router;
use magnetar_server::state::AppState;

/// How often expired stream cache entries are deleted
const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("MAGNETAR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        config_hash = &config_hash[..16],
        branding = %config.addon.branding,
        "Configuration loaded successfully"
    );

    // Search backend (required)
    info!("Initializing GraphQL searcher at {}", config.searcher.url);
    let searcher: Arc<dyn Searcher> = Arc::new(
        GraphqlSearcher::new(config.searcher.clone()).context("Failed to create searcher")?,
    );
    let mut resolver = StreamResolver::new(searcher, config.searcher.clone(), &config.addon);

    // Title lookups (optional, searches fall back to raw ids)
    match &config.metadata {
        Some(metadata_config) => match TmdbClient::new(metadata_config.clone()) {
            Ok(client) => {
                info!("Initializing TMDB title lookups");
                resolver = resolver.with_metadata(Arc::new(client));
            }
            Err(e) => warn!("TMDB lookups disabled: {}", e),
        },
        None => info!("No metadata lookup configured, searching by external id"),
    }

    // Debrid (optional)
    match &config.debrid {
        Some(debrid_config) => {
            info!("Initializing TorBox debrid client");
            let client = Arc::new(
                TorboxClient::new(debrid_config.clone())
                    .context("Failed to create debrid client")?,
            );
            resolver = resolver.with_debrid(client.clone(), client);
        }
        None => info!("No debrid service configured, returning torrent streams only"),
    }

    // Supplementary trackers (optional)
    match &config.trackers {
        Some(trackers_config) => {
            info!("Supplementary trackers from {}", trackers_config.url);
            let source = HttpTrackerSource::new(trackers_config.clone())
                .context("Failed to create tracker source")?;
            resolver = resolver.with_trackers(Arc::new(TrackerRegistry::new(Arc::new(source))));
        }
        None => info!("No supplementary tracker list configured"),
    }

    // Persistent stream cache
    let cache = Arc::new(
        SqliteStreamCache::new(&config.cache.path).context("Failed to open stream cache")?,
    );
    info!("Stream cache initialized at {:?}", config.cache.path);
    resolver = resolver.with_cache(cache.clone(), &config.cache);

    let purge_handle = tokio::spawn(purge_cache_periodically(cache));

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), Arc::new(resolver)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    purge_handle.abort();

    Ok(())
}

/// Delete expired cache entries now and then every interval.
async fn purge_cache_periodically(cache: Arc<SqliteStreamCache>) {
    let mut interval = tokio::time::interval(CACHE_PURGE_INTERVAL);
    loop {
        interval.tick().await;
        match cache.purge_expired() {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Purged expired stream cache entries"),
            Err(e) => warn!(error = %e, "Stream cache purge failed"),
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
