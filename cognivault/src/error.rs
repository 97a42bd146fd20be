use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CogniError {
    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API rate limit exceeded, retry after {retry_after:?} seconds")]
    ApiRateLimit { retry_after: Option<u64> },

    #[error("API authentication error: {0}")]
    ApiAuth(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },
}

impl CogniError {
    /// True for failures of an external oracle (embedding or LLM), which
    /// callers replace with a neutral value instead of aborting.
    pub fn is_oracle_failure(&self) -> bool {
        matches!(
            self,
            CogniError::Embedding(_)
                | CogniError::Http(_)
                | CogniError::ApiRateLimit { .. }
                | CogniError::ApiAuth(_)
                | CogniError::Llm(_)
                | CogniError::LlmUnavailable(_)
                | CogniError::LlmRateLimit { .. }
        )
    }

    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            CogniError::Database(_) | CogniError::StorageUnavailable(_)
        )
    }
}

impl IntoResponse for CogniError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CogniError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            CogniError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CogniError::Database(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            CogniError::StorageUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            CogniError::Embedding(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            CogniError::DimensionMismatch { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            CogniError::Http(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            CogniError::Json(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            CogniError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            CogniError::ApiRateLimit { .. } => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            CogniError::ApiAuth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            CogniError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            CogniError::Llm(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            CogniError::LlmUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            CogniError::LlmRateLimit { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!("LLM rate limit exceeded, retry after {retry_after:?} seconds"),
            ),
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, CogniError>;
