use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use coderchat_gateway::CompletionGateway;
use coderchat_shared::{MessageId, Role, UserId};
use coderchat_store::ChatMessage;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::chat::{self, lock_db, SharedDatabase};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::render::render_content;
use crate::session::{bearer_token, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub db: SharedDatabase,
    pub gateway: Arc<dyn CompletionGateway>,
    pub sessions: SessionStore,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/me", get(whoami))
        .route("/chat/messages", get(list_messages).post(send_message))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    model: String,
}

#[derive(Deserialize)]
struct CredentialsRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    user_id: UserId,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user_id: UserId,
    username: String,
}

#[derive(Serialize)]
struct WhoAmIResponse {
    user_id: UserId,
    username: String,
}

#[derive(Deserialize)]
struct SendMessageRequest {
    prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    /// `content` rendered for display.
    pub html: String,
    pub timestamp: String,
}

impl From<ChatMessage> for MessageDto {
    fn from(m: ChatMessage) -> Self {
        let html = render_content(&m.content);
        Self {
            id: m.id,
            role: m.role,
            content: m.content,
            html,
            timestamp: m.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct SendMessageResponse {
    user: MessageDto,
    assistant: MessageDto,
    /// User-facing warning when the reply is a placeholder.
    notice: Option<String>,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        model: state.config.model.clone(),
    })
}

/// Resolve the caller's session from the `Authorization: Bearer` header.
async fn require_session(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<(UserId, String), ServerError> {
    let token = bearer_token(headers).ok_or(ServerError::Unauthorized)?;
    let user_id = state
        .sessions
        .resolve(token)
        .await
        .ok_or(ServerError::Unauthorized)?;
    Ok((user_id, token.to_string()))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ServerError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(ServerError::BadRequest(
            "Username and password are required".into(),
        ));
    }

    let user_id = lock_db(&state.db)?.register_user(username, &req.password)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ServerError> {
    let user = {
        let guard = lock_db(&state.db)?;
        match guard.authenticate(req.username.trim(), &req.password)? {
            Some(id) => guard.get_user(id)?,
            None => return Err(ServerError::InvalidCredentials),
        }
    };

    let token = state.sessions.create(user.id).await;
    info!(user_id = %user.id, "user logged in");

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

async fn logout(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let (user_id, token) = require_session(&headers, &state).await?;
    state.sessions.revoke(&token).await;

    info!(user_id = %user_id, "user logged out");
    Ok(Json(serde_json::json!({ "logged_out": true })))
}

async fn whoami(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<WhoAmIResponse>, ServerError> {
    let (user_id, _) = require_session(&headers, &state).await?;
    let user = lock_db(&state.db)?.get_user(user_id)?;

    Ok(Json(WhoAmIResponse {
        user_id: user.id,
        username: user.username,
    }))
}

async fn list_messages(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<Vec<MessageDto>>, ServerError> {
    let (user_id, _) = require_session(&headers, &state).await?;
    let messages = lock_db(&state.db)?.list_messages(user_id)?;

    Ok(Json(messages.into_iter().map(MessageDto::from).collect()))
}

async fn send_message(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ServerError> {
    let (user_id, _) = require_session(&headers, &state).await?;
    let exchange =
        chat::submit_prompt(&state.db, state.gateway.as_ref(), user_id, &req.prompt).await?;

    Ok(Json(SendMessageResponse {
        user: exchange.user.into(),
        assistant: exchange.assistant.into(),
        notice: exchange.notice,
    }))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
