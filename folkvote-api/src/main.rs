//! FOLKVOTE backend - main entry point
//!
//! Serves the cover voting and ranking API over HTTP and forwards
//! notification events to the logging subscriber that stands in for the
//! external mailer.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use folkvote_common::config::resolve_database_path;
use folkvote_common::db::init_database;
use folkvote_common::events::EventBus;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folkvote_api::api;

/// Command-line arguments for folkvote-api
#[derive(Parser, Debug)]
#[command(name = "folkvote-api")]
#[command(about = "Cover voting and ranking backend for FOLKVOTE")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "FOLKVOTE_PORT")]
    port: u16,

    /// Path to the SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folkvote_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    info!("Starting FOLKVOTE backend on port {}", args.port);

    let db_path = resolve_database_path(args.database.as_deref())
        .context("Failed to resolve database path")?;
    info!("Database: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    // Notification events are consumed by the mailer; until it is wired
    // up, log them so deliveries are visible in development.
    let events = Arc::new(EventBus::new(256));
    let mut notifications = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = notifications.recv().await {
            match serde_json::to_string(&event) {
                Ok(payload) => info!("Notification: {}", payload),
                Err(e) => tracing::warn!("Undeliverable notification: {}", e),
            }
        }
    });

    let state = api::AppState { pool, events };
    let app = api::create_router(state);

    // Create socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
