//! EchoGifts storefront service - Main entry point
//!
//! Serves the order capture, checkout, and gallery API for the
//! personalized song storefront.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eg_store::api::{self, AppContext};
use eg_store::config::Config;
use eg_store::SharedState;

/// Command-line arguments for eg-store
#[derive(Parser, Debug)]
#[command(name = "eg-store")]
#[command(about = "Storefront service for EchoGifts")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5780", env = "EG_STORE_PORT")]
    port: u16,

    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Public origin used in success/cancel URLs
    #[arg(long, env = "EG_STORE_ORIGIN")]
    origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eg_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    let config_path =
        eg_common::config::resolve_config_file(args.config.as_deref(), "EG_STORE_CONFIG");
    let mut config = Config::load(config_path.as_deref())
        .context("Failed to load configuration")?;
    if let Some(origin) = args.origin {
        config.public_origin = origin;
    }

    info!("Starting EchoGifts storefront on port {}", args.port);
    info!("Public origin: {}", config.public_origin);
    if config.use_payment_links {
        info!("Checkout variant: hosted payment links");
    } else {
        info!("Checkout variant: client-side checkout sessions");
    }

    let state = Arc::new(SharedState::new(config));
    let app = api::create_router(AppContext { state });

    // Create socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    info!("Starting HTTP server on {}", addr);

    // Create and run the server
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
