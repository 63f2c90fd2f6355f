/// Application name
pub const APP_NAME: &str = "DeepSeek Coder Chat";

/// OpenRouter chat-completions endpoint
pub const DEFAULT_COMPLETION_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Model requested when none is configured
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-coder";

/// Upper bound on a single completion round trip
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 30;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Database file used when `DATABASE_PATH` is unset
pub const DEFAULT_DATABASE_FILE: &str = "chat.db";

/// Fenced-code delimiter that switches rendering to syntax highlighting
pub const CODE_FENCE: &str = "```";
