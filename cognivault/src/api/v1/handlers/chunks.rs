//! v1 Chunk ingestion and reset handlers.

use axum::extract::State;
use axum::Extension;
use validator::Validate;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::{ChunkResponse, CreateChunkRequest, DeleteChunksResponse};
use crate::api::v1::middleware::AuthenticatedUser;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;

/// `POST /api/v1/chunks`
#[utoipa::path(
    post,
    path = "/api/v1/chunks",
    tag = "chunks",
    operation_id = "chunks.create",
    request_body = CreateChunkRequest,
    responses(
        (status = 201, description = "Chunk stored", body = ChunkResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Missing credentials", body = ApiError),
        (status = 403, description = "Unknown API key", body = ApiError),
        (status = 503, description = "Storage unavailable", body = ApiError),
    )
)]
pub async fn create_chunk(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
    AppJson(req): AppJson<CreateChunkRequest>,
) -> ApiResponse<ChunkResponse> {
    if let Err(e) = req.validate() {
        return ApiResponse::error(ErrorCode::InvalidRequest, e.to_string());
    }

    match state.timeline.ingest_chunk(&user_id, req.into()).await {
        Ok(chunk) => ApiResponse::created(chunk.into()),
        Err(e) => e.into(),
    }
}

/// `DELETE /api/v1/chunks`
#[utoipa::path(
    delete,
    path = "/api/v1/chunks",
    tag = "chunks",
    operation_id = "chunks.deleteAll",
    responses(
        (status = 200, description = "All chunks of the caller removed", body = DeleteChunksResponse),
        (status = 401, description = "Missing credentials", body = ApiError),
        (status = 403, description = "Unknown API key", body = ApiError),
        (status = 503, description = "Storage unavailable", body = ApiError),
    )
)]
pub async fn delete_chunks(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
) -> ApiResponse<DeleteChunksResponse> {
    match state.timeline.reset_user(&user_id).await {
        Ok(deleted) => ApiResponse::success(DeleteChunksResponse { deleted }),
        Err(e) => e.into(),
    }
}
