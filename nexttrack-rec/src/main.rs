//! nexttrack-rec - Main entry point
//!
//! Music recommendation aggregator: serves the filter-builder frontend
//! and the /song, /artist, /genre and /recommendations endpoints over
//! the MusicBrainz, Wikidata, Spotify and Cover Art Archive APIs.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nexttrack_rec::{build_router, AppState};

/// Command-line arguments for nexttrack-rec
#[derive(Parser, Debug)]
#[command(name = "nexttrack-rec")]
#[command(about = "Music recommendation aggregator service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "NEXTTRACK_PORT")]
    port: u16,

    /// Address to bind
    #[arg(short, long, default_value = "0.0.0.0", env = "NEXTTRACK_BIND")]
    bind: IpAddr,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, env = "NEXTTRACK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexttrack_rec=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    info!("Starting NextTrack recommendation service on port {}", args.port);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve configuration (ENV > TOML > default)
    let config = nexttrack_common::config::resolve_config(args.config.as_deref())
        .context("Failed to resolve configuration")?;

    // Create API clients and application state
    let state = AppState::new(&config).context("Failed to initialize API clients")?;

    // Build the application router
    let app = build_router(state);

    let addr = SocketAddr::new(args.bind, args.port);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

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
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["nexttrack-rec"]).unwrap();
        assert_eq!(args.port, 8000);
        assert_eq!(args.bind, "0.0.0.0".parse::<IpAddr>().unwrap());
        assert!(args.config.is_none());
    }

    #[test]
    fn test_args_bind_override() {
        let args =
            Args::try_parse_from(["nexttrack-rec", "--bind", "127.0.0.1", "--port", "9000"])
                .unwrap();
        assert_eq!(args.bind, "127.0.0.1".parse::<IpAddr>().unwrap());
        assert_eq!(args.port, 9000);
    }

    #[test]
    fn test_args_reject_invalid_bind() {
        assert!(Args::try_parse_from(["nexttrack-rec", "--bind", "not-an-address"]).is_err());
    }
}
