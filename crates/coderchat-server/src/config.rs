//! Server configuration loaded from environment variables.
//!
//! Everything except the completion API key has a default so the server can
//! start locally with a single variable set.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use coderchat_gateway::GatewayConfig;
use coderchat_shared::constants::{
    APP_NAME, DEFAULT_COMPLETION_ENDPOINT, DEFAULT_COMPLETION_TIMEOUT_SECS, DEFAULT_DATABASE_FILE,
    DEFAULT_HTTP_PORT, DEFAULT_MODEL,
};

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./chat.db`
    pub database_path: PathBuf,

    /// Human-readable name reported by `/info`.
    /// Env: `INSTANCE_NAME`
    pub instance_name: String,

    // -- Completion API --

    /// Bearer token for the completion API.  Required; never logged.
    /// Env: `OPENROUTER_API_KEY`
    pub api_key: Option<String>,

    /// Env: `COMPLETION_MODEL`
    /// Default: `deepseek/deepseek-coder`
    pub model: String,

    /// Env: `COMPLETION_ENDPOINT`
    pub completion_endpoint: String,

    /// Env: `COMPLETION_TIMEOUT_SECS`
    /// Default: `30`
    pub completion_timeout: Duration,

    /// Sent as `HTTP-Referer`.
    /// Env: `APP_REFERER`
    pub app_referer: Option<String>,

    /// Sent as `X-Title`.
    /// Env: `APP_TITLE`
    pub app_title: Option<String>,

    // -- Sessions --

    /// Idle time after which a login token stops working.
    /// Env: `SESSION_TTL_SECS`
    /// Default: `86400`
    pub session_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
            instance_name: APP_NAME.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            completion_endpoint: DEFAULT_COMPLETION_ENDPOINT.to_string(),
            completion_timeout: Duration::from_secs(DEFAULT_COMPLETION_TIMEOUT_SECS),
            app_referer: None,
            app_title: None,
            session_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = non_empty("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(path) = non_empty("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(name) = non_empty("INSTANCE_NAME") {
            config.instance_name = name;
        }

        // -- Completion API --

        config.api_key = non_empty("OPENROUTER_API_KEY");

        if let Some(model) = non_empty("COMPLETION_MODEL") {
            config.model = model;
        }

        if let Some(endpoint) = non_empty("COMPLETION_ENDPOINT") {
            config.completion_endpoint = endpoint;
        }

        let timeout = non_empty("COMPLETION_TIMEOUT_SECS");
        if let Some(secs) = parse_positive("COMPLETION_TIMEOUT_SECS", timeout) {
            config.completion_timeout = Duration::from_secs(secs);
        }

        config.app_referer = non_empty("APP_REFERER");
        config.app_title = non_empty("APP_TITLE");

        // -- Sessions --

        if let Some(secs) = parse_positive("SESSION_TTL_SECS", non_empty("SESSION_TTL_SECS")) {
            config.session_ttl = Duration::from_secs(secs);
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// Settings for the completion client, or `None` without an API key.
    pub fn gateway_config(&self) -> Option<GatewayConfig> {
        let api_key = self.api_key.clone()?;
        Some(
            GatewayConfig::new(api_key)
                .with_endpoint(self.completion_endpoint.clone())
                .with_model(self.model.clone())
                .with_app_identity(self.app_referer.clone(), self.app_title.clone())
                .with_timeout(self.completion_timeout),
        )
    }
}

fn parse_positive(key: &str, value: Option<String>) -> Option<u64> {
    let value = value?;
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(key, value = %value, "Invalid positive integer, using default");
            None
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("instance_name", &self.instance_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("completion_endpoint", &self.completion_endpoint)
            .field("completion_timeout", &self.completion_timeout)
            .field("app_referer", &self.app_referer)
            .field("app_title", &self.app_title)
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}
