use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Remote answered 429.
    #[error("API rate limit reached")]
    RateLimited,

    /// Remote answered 402.
    #[error("API quota exceeded")]
    QuotaExceeded,

    /// Timeout, connection failure, other non-2xx status or an unusable body.
    #[error("API request failed: {0}")]
    RequestFailed(String),
}

impl GatewayError {
    /// Message shown to the user next to the conversation.
    pub fn user_notice(&self) -> String {
        match self {
            Self::RateLimited => "API rate limit reached. Please try again later.".to_string(),
            Self::QuotaExceeded => "API quota exceeded. Upgrade your OpenRouter plan.".to_string(),
            Self::RequestFailed(_) => self.to_string(),
        }
    }

    /// Text stored as the assistant message in place of a real reply.
    pub fn placeholder_reply(&self) -> &'static str {
        match self {
            Self::RateLimited => "I'm currently rate-limited. Try again in a moment.",
            Self::QuotaExceeded => "Daily limit reached. See OpenRouter.ai to upgrade.",
            Self::RequestFailed(_) => "Sorry, I couldn't get a response. Please try again.",
        }
    }
}
