use std::time::Duration;

use coderchat_shared::constants::{
    DEFAULT_COMPLETION_ENDPOINT, DEFAULT_COMPLETION_TIMEOUT_SECS, DEFAULT_MODEL,
};

/// Connection settings for the remote completion service.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Full URL of the chat-completions endpoint.
    pub endpoint: String,
    /// Bearer token.  Never logged; redacted from `Debug`.
    pub api_key: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Sent as `HTTP-Referer` to identify the calling application.
    pub referer: Option<String>,
    /// Sent as `X-Title` to identify the calling application.
    pub title: Option<String>,
    /// Bound on a whole request, connect to last body byte.
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_COMPLETION_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            referer: None,
            title: None,
            timeout: Duration::from_secs(DEFAULT_COMPLETION_TIMEOUT_SECS),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_app_identity(mut self, referer: Option<String>, title: Option<String>) -> Self {
        self.referer = referer;
        self.title = title;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .field("timeout", &self.timeout)
            .finish()
    }
}
