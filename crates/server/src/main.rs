use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gamelist_core::{
    load_config, validate_config, CompletionatorFetcher, Config, DisabledFetcher, Fetcher,
    GameLibrary, GameStore, HltbFetcher, SourceKind, SqliteGameStore,
};
use gamelist_server::{api::create_router, state::AppState};

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
    let config_path = std::env::var("GAMELIST_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    let store: Arc<dyn GameStore> = Arc::new(
        SqliteGameStore::new(&config.database.path).context("Failed to open game store")?,
    );
    info!("Game store initialized");

    let hltb = build_fetcher(SourceKind::Hltb, &config)?;
    let completionator = build_fetcher(SourceKind::Completionator, &config)?;

    let library = GameLibrary::new(store, hltb, completionator);
    let state = Arc::new(AppState::new(config.clone(), library));

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

    info!("Server shut down");
    Ok(())
}

/// Build the fetcher for a source, or a stand-in that finds nothing if it is disabled.
fn build_fetcher(source: SourceKind, config: &Config) -> Result<Arc<dyn Fetcher>> {
    let source_config = match source {
        SourceKind::Hltb => &config.sources.hltb,
        SourceKind::Completionator => &config.sources.completionator,
    };

    if !source_config.enabled {
        info!("Source {} disabled in config", source);
        return Ok(Arc::new(DisabledFetcher(source)));
    }

    info!("Initializing {} fetcher at {}", source, source_config.base_url);
    let fetcher: Arc<dyn Fetcher> = match source {
        SourceKind::Hltb => Arc::new(
            HltbFetcher::new(source_config.clone(), &config.http)
                .context("Failed to create HowLongToBeat fetcher")?,
        ),
        SourceKind::Completionator => Arc::new(
            CompletionatorFetcher::new(source_config.clone(), &config.http)
                .context("Failed to create Completionator fetcher")?,
        ),
    };
    Ok(fetcher)
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
