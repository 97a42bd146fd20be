//! # V1 API Response Envelope & Error Contract
//!
//! Every v1 endpoint returns an [`ApiResponse<T>`] envelope:
//!
//! ```json
//! { "data": { ... } }                                   // success
//! { "error": { "code": "forbidden", "message": "..." } } // failure
//! ```
//!
//! Exactly one of `data` and `error` is present.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::CogniError;

/// Machine-readable error code included in every error response.
///
/// Serialized as a snake_case string on the wire (e.g. `"invalid_request"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed body or failed validation. HTTP 400.
    InvalidRequest,
    /// Missing credentials, or no API keys configured. HTTP 401.
    Unauthorized,
    /// Credentials were presented but are not recognized. HTTP 403.
    Forbidden,
    /// HTTP 404.
    NotFound,
    /// Internal details are never leaked to the client. HTTP 500.
    InternalError,
    /// A backing store or model is temporarily unreachable. HTTP 503.
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::NotFound => write!(f, "not_found"),
            Self::InternalError => write!(f, "internal_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
        }
    }
}

/// Structured error payload within the API envelope.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    pub code: ErrorCode,
    /// Human-readable description safe to display to end users.
    pub message: String,
}

/// Canonical v1 API response envelope.
///
/// The HTTP status is derived from the error code on failure, or set by the
/// success constructor used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// HTTP 200.
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::OK,
        }
    }

    /// HTTP 201.
    pub fn created(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::CREATED,
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        Self {
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize v1 response");
                let body = serde_json::json!({
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

fn rate_limit_message(retry_after: Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!("Upstream rate limit exceeded, retry after {secs} seconds"),
        None => "Upstream rate limit exceeded".to_string(),
    }
}

impl<T: Serialize> From<CogniError> for ApiResponse<T> {
    /// Internal details are never leaked: anything mapped to
    /// `internal_error` is logged and replaced by a generic message.
    fn from(err: CogniError) -> Self {
        match err {
            CogniError::NotFound(ref msg) => ApiResponse::error(ErrorCode::NotFound, msg.clone()),

            CogniError::Validation(ref msg) => {
                ApiResponse::error(ErrorCode::InvalidRequest, msg.clone())
            }

            CogniError::Json(ref e) => {
                ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid JSON: {e}"))
            }

            CogniError::StorageUnavailable(ref msg) => {
                tracing::warn!(error = %msg, "Storage unavailable");
                ApiResponse::error(ErrorCode::ServiceUnavailable, "Storage is unavailable")
            }

            CogniError::LlmUnavailable(ref msg) => {
                ApiResponse::error(ErrorCode::ServiceUnavailable, msg.clone())
            }

            CogniError::ApiRateLimit { retry_after } | CogniError::LlmRateLimit { retry_after } => {
                ApiResponse::error(ErrorCode::ServiceUnavailable, rate_limit_message(retry_after))
            }

            ref internal @ (CogniError::Database(_)
            | CogniError::DimensionMismatch { .. }
            | CogniError::Embedding(_)
            | CogniError::Http(_)
            | CogniError::Io(_)
            | CogniError::ApiAuth(_)
            | CogniError::Internal(_)
            | CogniError::Llm(_)) => {
                tracing::error!(error = %internal, "Internal error mapped to v1 response");
                ApiResponse::error(ErrorCode::InternalError, "An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_serializes_without_error() {
        let resp = ApiResponse::success("hello");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["data"], "hello");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn error_response_serializes_without_data() {
        let resp = ApiResponse::<()>::error(ErrorCode::Forbidden, "nope");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["code"], "forbidden");
        assert_eq!(json["error"]["message"], "nope");
    }

    #[test]
    fn error_code_status_mapping() {
        assert_eq!(ErrorCode::InvalidRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::InternalError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::ServiceUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn error_code_display_matches_wire_format() {
        for code in [
            ErrorCode::InvalidRequest,
            ErrorCode::Forbidden,
            ErrorCode::ServiceUnavailable,
        ] {
            let json = serde_json::to_value(&code).expect("serialize");
            assert_eq!(json, code.to_string());
        }
    }

    #[test]
    fn created_response_has_201_status() {
        assert_eq!(ApiResponse::created("x").status(), StatusCode::CREATED);
    }

    #[test]
    fn dimension_mismatch_does_not_leak() {
        let resp: ApiResponse<()> = CogniError::DimensionMismatch {
            left: 768,
            right: 384,
        }
        .into();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = resp.error.as_ref().expect("error");
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "An internal error occurred");
    }

    #[test]
    fn validation_maps_to_invalid_request() {
        let resp: ApiResponse<()> = CogniError::Validation("text cannot be empty".into()).into();
        let err = resp.error.as_ref().expect("error");
        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert_eq!(err.message, "text cannot be empty");
    }

    #[test]
    fn storage_unavailable_maps_to_503() {
        let resp: ApiResponse<()> = CogniError::StorageUnavailable("refused".into()).into();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            resp.error.as_ref().expect("error").message,
            "Storage is unavailable"
        );
    }

    #[test]
    fn rate_limit_mentions_retry_after() {
        let resp: ApiResponse<()> = CogniError::LlmRateLimit {
            retry_after: Some(30),
        }
        .into();
        let err = resp.error.as_ref().expect("error");
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
        assert!(err.message.contains("30"));
    }
}
