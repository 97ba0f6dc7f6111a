//! Tramcan Sync Server
//!
//! Serves the shared weighing station store to stations over HTTP.
//!
//! # Configuration
//!
//! Environment variables:
//! - `TRAMCAN_PORT`: Port to listen on (default: 8080)
//! - `TRAMCAN_DATABASE_PATH`: SQLite database (default: ~/.local/share/tramcan/tramcan.db)
//! - `TRAMCAN_MAX_CONNECTIONS`: Database pool size (default: 5)
//! - `TRAMCAN_CONFIG`: Path to config file (default: ~/.config/tramcan/config.yaml)
//!
//! # Config File Format
//!
//! ```yaml
//! database_path: /srv/tramcan/tramcan.db
//! port: 8080
//! max_connections: 5
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tramcan_sync::config::Config;
use tramcan_sync::db::{init_db, EntityStore};
use tramcan_sync::server::{router, AppState};
use tramcan_sync::sync::SyncService;

#[derive(Parser)]
#[command(name = "tramcan-server")]
#[command(version)]
#[command(about = "Sync server for weighing stations", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tramcan_sync=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config)?;

    match &config.config_file {
        Some(path) => tracing::info!("Config file: {}", path.display()),
        None => tracing::info!("No config file; using defaults and environment"),
    }
    tracing::info!(
        "Database: {} (source: {})",
        config.database_path.value.display(),
        config.database_path.source
    );

    let pool = init_db(&config.database_path.value, config.max_connections.value).await?;
    let state = AppState::new(SyncService::new(EntityStore::new(pool.clone())));
    let app = router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port.value));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
