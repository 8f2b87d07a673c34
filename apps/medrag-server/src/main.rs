//! MedRAG Server
//!
//! Uploads medical PDFs, extracts their text with OCR, and produces structured
//! summaries through a hosted language model.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medrag_server::config::Config;
use medrag_server::db;
use medrag_server::state::AppState;
use medrag_server::storage::LocalStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medrag_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting {} Server v{}", config.app_name, env!("CARGO_PKG_VERSION"));
    tracing::info!("Upload folder: {}", config.uploads.folder.display());
    tracing::info!("OCR providers: {:?}", config.ocr.providers);
    if config.llm.api_key.is_none() {
        tracing::info!("OPENAI_API_KEY not set; summary requests must carry a key");
    }

    // Initialize upload storage
    let storage = LocalStorage::open(&config.uploads.folder)
        .await
        .context("Failed to create upload folder")?;

    // Initialize database
    if let Some(parent) = sqlite_parent_dir(&config.database.url) {
        tokio::fs::create_dir_all(parent)
            .await
            .context("Failed to create database directory")?;
    }
    let db_pool = db::create_pool(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database initialized at {}", config.database.url);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let app_state = AppState::new(config, db_pool, storage).await;
    let app = medrag_server::app(app_state);

    // Start server with graceful shutdown
    tracing::info!("MedRAG Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Directory holding a file-backed SQLite database, if any
fn sqlite_parent_dir(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_parent_dir() {
        assert_eq!(
            sqlite_parent_dir("sqlite:./data/medrag.db"),
            Some(Path::new("./data"))
        );
        assert_eq!(
            sqlite_parent_dir("sqlite:///var/lib/medrag/db.sqlite?mode=rwc"),
            Some(Path::new("/var/lib/medrag"))
        );
        assert_eq!(sqlite_parent_dir("sqlite::memory:"), None);
        assert_eq!(sqlite_parent_dir("sqlite:medrag.db"), None);
    }
}
