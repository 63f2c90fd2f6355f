use async_trait::async_trait;
use coderchat_shared::ChatTurn;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::CompletionGateway;

/// Longest slice of an error body carried into `RequestFailed`.
const ERROR_BODY_SNIPPET: usize = 200;

/// HTTP client for an OpenRouter-style `/chat/completions` endpoint.
pub struct OpenRouterClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl OpenRouterClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::RequestFailed(format!("building HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::RequestFailed(format!(
                "request timed out after {}s",
                self.config.timeout.as_secs_f64()
            ))
        } else {
            GatewayError::RequestFailed(e.to_string())
        }
    }
}

#[async_trait]
impl CompletionGateway for OpenRouterClient {
    async fn complete(&self, history: &[ChatTurn]) -> Result<String, GatewayError> {
        if history.is_empty() {
            return Err(GatewayError::RequestFailed(
                "conversation history is empty".into(),
            ));
        }

        let body = CompletionRequest {
            model: &self.config.model,
            messages: history,
        };

        let mut request = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body);
        if let Some(ref referer) = self.config.referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(ref title) = self.config.title {
            request = request.header("X-Title", title);
        }

        debug!(
            model = %self.config.model,
            turns = history.len(),
            "sending completion request"
        );

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        if let Err(err) = classify_status(status) {
            let detail = response.text().await.unwrap_or_default();
            warn!(
                status = %status,
                body = %snippet(&detail),
                "completion request rejected"
            );
            return Err(err);
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        parse_reply(&text)
    }
}

/// Map a response status onto the gateway's failure kinds.
pub fn classify_status(status: StatusCode) -> Result<(), GatewayError> {
    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(GatewayError::RateLimited),
        StatusCode::PAYMENT_REQUIRED => Err(GatewayError::QuotaExceeded),
        s if s.is_success() => Ok(()),
        s => Err(GatewayError::RequestFailed(format!("server responded {s}"))),
    }
}

/// Extract `choices[0].message.content` from a completion response body.
pub fn parse_reply(body: &str) -> Result<String, GatewayError> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::RequestFailed(format!("invalid response body: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GatewayError::RequestFailed("response contained no reply".into()))
}

fn snippet(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_SNIPPET) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured {
        body: Arc<Mutex<Option<Value>>>,
        headers: Arc<Mutex<Option<HeaderMap>>>,
    }

    /// Serve `status` + `reply` from a throwaway local endpoint.
    async fn fake_remote(
        status: StatusCode,
        reply: Value,
        delay: Duration,
    ) -> (SocketAddr, Captured) {
        let captured = Captured::default();
        let sink = captured.clone();

        let app = Router::new().route(
            "/api/v1/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let sink = sink.clone();
                let reply = reply.clone();
                async move {
                    *sink.body.lock().unwrap() = Some(body);
                    *sink.headers.lock().unwrap() = Some(headers);
                    tokio::time::sleep(delay).await;
                    (status, Json(reply))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, captured)
    }

    fn client_for(addr: SocketAddr) -> OpenRouterClient {
        let config = GatewayConfig::new("sk-test")
            .with_endpoint(format!("http://{addr}/api/v1/chat/completions"))
            .with_model("test/model")
            .with_app_identity(
                Some("https://chat.example".into()),
                Some("Coder Chat".into()),
            )
            .with_timeout(Duration::from_millis(500));
        OpenRouterClient::new(config).unwrap()
    }

    fn ok_reply(text: &str) -> Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": text } } ] })
    }

    #[test]
    fn status_classification() {
        assert_eq!(classify_status(StatusCode::OK), Ok(()));
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            Err(GatewayError::RateLimited)
        );
        assert_eq!(
            classify_status(StatusCode::PAYMENT_REQUIRED),
            Err(GatewayError::QuotaExceeded)
        );
        for status in [
            StatusCode::UNAUTHORIZED,
            StatusCode::BAD_REQUEST,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
        ] {
            assert!(matches!(
                classify_status(status),
                Err(GatewayError::RequestFailed(_))
            ));
        }
    }

    #[test]
    fn parse_reply_takes_first_choice_verbatim() {
        let body = r#"{"choices":[{"message":{"content":"  4\n"}},{"message":{"content":"5"}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "  4\n");
    }

    #[test]
    fn parse_reply_rejects_unusable_bodies() {
        for body in [
            "not json",
            r#"{"choices":[]}"#,
            r#"{}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
        ] {
            assert!(
                matches!(parse_reply(body), Err(GatewayError::RequestFailed(_))),
                "body {body} should fail"
            );
        }
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let long = "é".repeat(500);
        assert_eq!(snippet(&long).chars().count(), ERROR_BODY_SNIPPET);
        assert_eq!(snippet("short"), "short");
    }

    #[tokio::test]
    async fn sends_full_history_and_headers() {
        let (addr, captured) = fake_remote(StatusCode::OK, ok_reply("4"), Duration::ZERO).await;
        let client = client_for(addr);

        let history = vec![
            ChatTurn::user("hi"),
            ChatTurn::assistant("hello"),
            ChatTurn::user("What is 2+2?"),
        ];
        let reply = client.complete(&history).await.unwrap();
        assert_eq!(reply, "4");

        let body = captured.body.lock().unwrap().clone().unwrap();
        assert_eq!(
            body,
            json!({
                "model": "test/model",
                "messages": [
                    { "role": "user", "content": "hi" },
                    { "role": "assistant", "content": "hello" },
                    { "role": "user", "content": "What is 2+2?" },
                ]
            })
        );

        let headers = captured.headers.lock().unwrap().clone().unwrap();
        assert_eq!(headers["authorization"], "Bearer sk-test");
        assert_eq!(headers["http-referer"], "https://chat.example");
        assert_eq!(headers["x-title"], "Coder Chat");
        assert!(headers["content-type"]
            .to_str()
            .unwrap()
            .starts_with("application/json"));
    }

    #[tokio::test]
    async fn rate_limited_on_429() {
        let (addr, _) = fake_remote(
            StatusCode::TOO_MANY_REQUESTS,
            json!({ "error": { "message": "slow down" } }),
            Duration::ZERO,
        )
        .await;
        let err = client_for(addr)
            .complete(&[ChatTurn::user("hi")])
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::RateLimited);
    }

    #[tokio::test]
    async fn quota_exceeded_on_402() {
        let (addr, _) = fake_remote(
            StatusCode::PAYMENT_REQUIRED,
            json!({ "error": "insufficient credits" }),
            Duration::ZERO,
        )
        .await;
        let err = client_for(addr)
            .complete(&[ChatTurn::user("hi")])
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::QuotaExceeded);
    }

    #[tokio::test]
    async fn other_statuses_fail_generically() {
        let (addr, _) = fake_remote(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "boom" }),
            Duration::ZERO,
        )
        .await;
        let err = client_for(addr)
            .complete(&[ChatTurn::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::RequestFailed(ref m) if m.contains("500")));
    }

    #[tokio::test]
    async fn times_out() {
        let (addr, _) = fake_remote(StatusCode::OK, ok_reply("late"), Duration::from_secs(3)).await;
        let err = client_for(addr)
            .complete(&[ChatTurn::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::RequestFailed(ref m) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn connection_refused_is_request_failed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(addr)
            .complete(&[ChatTurn::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn empty_history_fails_without_network() {
        // Nothing listens on port 9; the precondition check fires first.
        let client = client_for(([127, 0, 0, 1], 9).into());
        let err = client.complete(&[]).await.unwrap_err();
        assert!(matches!(err, GatewayError::RequestFailed(ref m) if m.contains("empty")));
    }
}
