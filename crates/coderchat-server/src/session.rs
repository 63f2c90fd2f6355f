//! Login sessions.
//!
//! A successful login issues an opaque bearer token; every later request
//! names its session explicitly through the `Authorization` header.  Tokens
//! live in memory only, so a restart logs everyone out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use coderchat_shared::UserId;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Session {
    user_id: UserId,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Start a session and return its token.
    pub async fn create(&self, user_id: UserId) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.lock().await.insert(
            token.clone(),
            Session {
                user_id,
                last_seen: Instant::now(),
            },
        );
        token
    }

    /// Resolve a token to its user, refreshing the idle timer.
    pub async fn resolve(&self, token: &str) -> Option<UserId> {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();

        let session = sessions.get_mut(token)?;
        if now.duration_since(session.last_seen) >= self.ttl {
            sessions.remove(token);
            return None;
        }
        session.last_seen = now;
        Some(session.user_id)
    }

    /// End a session.  Returns whether the token was live.
    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.lock().await.remove(token).is_some()
    }

    /// Drop every session idle for longer than the TTL.
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_seen) < self.ttl);
        before - sessions.len()
    }
}

/// Pull the bearer token out of an `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[tokio::test]
    async fn test_create_resolve_revoke() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.create(UserId(3)).await;

        assert_eq!(store.resolve(&token).await, Some(UserId(3)));
        assert!(store.revoke(&token).await);
        assert_eq!(store.resolve(&token).await, None);
        assert!(!store.revoke(&token).await);
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let store = SessionStore::new(Duration::from_secs(60));
        let a = store.create(UserId(1)).await;
        let b = store.create(UserId(1)).await;
        assert_ne!(a, b);
        assert_eq!(store.resolve(&a).await, Some(UserId(1)));
        assert_eq!(store.resolve(&b).await, Some(UserId(1)));
    }

    #[tokio::test]
    async fn test_expired_sessions() {
        let store = SessionStore::new(Duration::from_millis(20));
        let token = store.create(UserId(1)).await;
        let _other = store.create(UserId(2)).await;

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.resolve(&token).await, None);
        assert_eq!(store.purge_expired().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert_eq!(store.resolve("nope").await, None);
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert("authorization", HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
