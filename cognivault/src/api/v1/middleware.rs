//! # V1 Bearer Authentication
//!
//! Resolves `Authorization: Bearer <token>` to a user id through the
//! configured `COGNIVAULT_API_KEYS` table and hands it to handlers as an
//! [`AuthenticatedUser`] request extension. Handlers never accept a user id
//! from the request itself.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::state::AppState;

use super::response::{ApiResponse, ErrorCode};

/// The user a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

/// - No keys configured → 401; protected routes stay locked.
/// - Missing or malformed header → 401.
/// - Unknown token → 403.
pub async fn v1_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if state.config.server.api_keys.is_empty() {
        return ApiResponse::<()>::error(
            ErrorCode::Unauthorized,
            "API keys not configured. Set COGNIVAULT_API_KEYS to enable access.",
        )
        .into_response();
    }

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => token.trim(),
            _ => {
                return ApiResponse::<()>::error(
                    ErrorCode::Unauthorized,
                    "Invalid authorization header format. Expected: Bearer <token>",
                )
                .into_response();
            }
        },
        None => {
            return ApiResponse::<()>::error(
                ErrorCode::Unauthorized,
                "Missing authorization header",
            )
            .into_response();
        }
    };

    let Some(user_id) = state.config.server.api_keys.get(token).cloned() else {
        tracing::debug!("Rejected request with unknown API key");
        return ApiResponse::<()>::error(ErrorCode::Forbidden, "Invalid API key").into_response();
    };

    request.extensions_mut().insert(AuthenticatedUser(user_id));
    next.run(request).await
}
