//! # coderchat-server
//!
//! Multi-user chat service in front of a hosted coding model.
//!
//! This binary provides:
//! - **Accounts and sessions**: registration, login and bearer-token sessions
//! - **Chat log**: every prompt and reply persisted per user in SQLite
//! - **Completion gateway**: the full history replayed to OpenRouter on each
//!   prompt, with placeholder replies when the upstream call fails
//! - **REST API** (axum) serving messages pre-rendered as HTML with
//!   syntax-coloured code blocks

mod api;
mod chat;
mod config;
mod error;
mod render;
mod session;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use coderchat_gateway::OpenRouterClient;
use coderchat_store::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::session::SessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,coderchat_server=debug")),
        )
        .init();

    info!("Starting coderchat server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    let gateway_config = config
        .gateway_config()
        .context("OPENROUTER_API_KEY is not set; refusing to start without a completion API key")?;

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let db = Database::open_at(&config.database_path)
        .with_context(|| format!("opening database at {}", config.database_path.display()))?;
    info!(path = %config.database_path.display(), "Database ready");

    let gateway = OpenRouterClient::new(gateway_config).context("building completion client")?;

    let sessions = SessionStore::new(config.session_ttl);
    let http_addr = config.http_addr;

    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        gateway: Arc::new(gateway),
        sessions: sessions.clone(),
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background task
    // -----------------------------------------------------------------------

    // Expired sessions (every minute)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "Expired sessions removed");
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
