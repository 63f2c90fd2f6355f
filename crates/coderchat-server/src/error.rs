use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use coderchat_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Please log in to chat.")]
    Unauthorized,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Username already exists: {0}")]
    DuplicateUser(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Storage unavailable: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateUser(name) => ServerError::DuplicateUser(name),
            StoreError::InvalidRole(role) => ServerError::BadRequest(role.to_string()),
            StoreError::NotFound => ServerError::NotFound,
            other => ServerError::Storage(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Unauthorized | ServerError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ServerError::DuplicateUser(_) => (StatusCode::CONFLICT, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::Storage(_) => {
                tracing::error!(error = %self, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable".to_string())
            }
            ServerError::Internal(_) => {
                tracing::error!(error = %self, "internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
