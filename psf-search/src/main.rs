//! Product Spec Finder (psf-search) - Main entry point
//!
//! Loads configuration, builds the enabled source adapters and serves the
//! search/bulk/export HTTP API plus the browser page.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use psf_common::config::{CliOverrides, Config};
use psf_search::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for psf-search
#[derive(Parser, Debug)]
#[command(name = "psf-search")]
#[command(about = "Product specification search service")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "PSF_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PSF_PORT")]
    port: Option<u16>,

    /// Serve the static sample set instead of live sources
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG wins; otherwise the config's level is applied once it is loaded
    let rust_log = EnvFilter::try_from_default_env().ok();
    let from_env = rust_log.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(rust_log.unwrap_or_else(|| EnvFilter::new("info")));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let cli = CliOverrides {
        config_path: args.config,
        bind: args.bind,
        port: args.port,
        demo: args.demo,
    };
    let config = Config::load(&cli).context("Failed to load configuration")?;

    if !from_env {
        let directives = format!("{},tower_http=info", config.log_level);
        match EnvFilter::try_new(&directives) {
            Ok(level) => {
                if let Err(e) = filter_handle.reload(level) {
                    warn!("Failed to apply log level '{}': {}", config.log_level, e);
                }
            }
            Err(e) => warn!("Invalid log level '{}': {}", config.log_level, e),
        }
    }

    info!(
        "Starting psf-search v{} ({}) on {}:{}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        config.bind,
        config.port
    );

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind, config.port))?;

    let state = AppState::from_config(config).context("Failed to initialize source adapters")?;

    let sources = state.pipeline.source_ids();
    if sources.is_empty() {
        warn!("No data sources enabled; searches will fail until credentials are configured");
    } else {
        info!("Sources (priority order): {}", sources.join(", "));
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
