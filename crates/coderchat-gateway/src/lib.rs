// Completion gateway: turns an ordered conversation into one reply by
// calling a remote chat-completions endpoint (OpenRouter-compatible).

pub mod client;
pub mod config;
pub mod error;

use async_trait::async_trait;
use coderchat_shared::ChatTurn;

pub use client::OpenRouterClient;
pub use config::GatewayConfig;
pub use error::GatewayError;

/// Anything that can produce the next assistant reply for a conversation.
///
/// Implementations are stateless: every call is a fresh, independent round
/// trip with no retry and no caching.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// `history` is oldest first and must end with the newest user turn.
    async fn complete(&self, history: &[ChatTurn]) -> Result<String, GatewayError>;
}
