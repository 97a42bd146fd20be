//! Chunk ingestion DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models;

/// Request body for `POST /v1/chunks`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChunkRequest {
    #[validate(length(min = 1, max = 100_000))]
    pub text: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub tags: Vec<String>,
    #[validate(length(max = 2000))]
    pub summary: Option<String>,
    /// Source file, if the chunk was extracted from one.
    pub file_id: Option<String>,
    /// Defaults to the time of ingestion.
    #[validate(custom(function = "validate_created_at"))]
    pub created_at: Option<DateTime<Utc>>,
}

fn validate_created_at(created_at: &DateTime<Utc>) -> Result<(), ValidationError> {
    if models::is_storable_timestamp(created_at) {
        Ok(())
    } else {
        Err(ValidationError::new("created_at_out_of_range")
            .with_message("createdAt must fall between years 0000 and 9999".into()))
    }
}

impl From<CreateChunkRequest> for models::NewChunk {
    fn from(req: CreateChunkRequest) -> Self {
        Self {
            text: Some(req.text),
            tags: req.tags,
            summary: req.summary,
            file_id: req.file_id,
            created_at: req.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChunkResponse {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<models::Chunk> for ChunkResponse {
    fn from(chunk: models::Chunk) -> Self {
        Self {
            id: chunk.id,
            user_id: chunk.user_id,
            file_id: chunk.file_id,
            tags: chunk.tags,
            summary: chunk.summary,
            created_at: chunk.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DeleteChunksResponse {
    pub deleted: u64,
}
