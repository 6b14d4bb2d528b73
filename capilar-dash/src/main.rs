//! capilar-dash - review and correction dashboard for the hair-product catalog
//!
//! Loads the harvested products and tracking documents once, applies the
//! persisted edit overlay, and serves the dashboard UI plus its JSON API.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use capilar_common::config::{load_toml_config, CliOverrides, DashboardConfig};
use capilar_common::records::{load_products, load_tracking};
use capilar_common::{Dashboard, FileStore, MemoryStore, OverlayStore};
use capilar_dash::{build_router, AppState, SharedStore};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for capilar-dash
#[derive(Parser, Debug)]
#[command(name = "capilar-dash")]
#[command(about = "Catalog review and correction dashboard")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "CAPILAR_PORT")]
    port: Option<u16>,

    /// Root folder holding the harvest documents and saved edits
    #[arg(short, long, env = "CAPILAR_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Explicit TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Products document (default: <root>/data.json)
    #[arg(long)]
    products: Option<PathBuf>,

    /// Tracking document (default: <root>/tracking.json)
    #[arg(long)]
    tracking: Option<PathBuf>,

    /// Storage key of the edit overlay
    #[arg(long)]
    storage_key: Option<String>,

    /// Keep edits in memory only; nothing is written to disk
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml = load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;
    let config = DashboardConfig::resolve(
        CliOverrides {
            root_folder: args.root_folder,
            port: args.port,
            products_path: args.products,
            tracking_path: args.tracking,
            storage_key: args.storage_key,
        },
        toml,
    );

    init_tracing(&config.log_level);

    info!(
        "Starting Capilar Dashboard (capilar-dash) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Root folder: {}", config.root_folder.display());

    let products = load_products(&config.products_path).context("Failed to load products")?;
    let tracking = load_tracking(&config.tracking_path).context("Failed to load tracking")?;

    let backend: SharedStore = if args.ephemeral {
        warn!("Ephemeral mode: edits will be lost on exit");
        Box::new(MemoryStore::new())
    } else {
        let folder = config.store_folder();
        info!("Edit store: {}", folder.display());
        Box::new(
            FileStore::open(&folder)
                .with_context(|| format!("Failed to open edit store {}", folder.display()))?,
        )
    };
    let store = OverlayStore::open(backend, config.storage_key.clone());

    let state = AppState::new(Dashboard::new(products, tracking, store));
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("capilar-dash listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// RUST_LOG wins; otherwise the configured level for our crates
fn init_tracing(level: &str) {
    let default_filter = format!(
        "capilar_dash={level},capilar_common={level},tower_http={level}",
        level = level
    );
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
