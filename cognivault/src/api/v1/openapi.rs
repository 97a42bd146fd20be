use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CogniVault API",
        version = "1.0.0",
        description = "Cognitive timeline backend: topic evolution, branch triggers and emotion trends over a user's content.",
    ),
    paths(
        handlers::health::health_check,
        handlers::timeline::get_events,
        handlers::timeline::get_topic_spikes,
        handlers::timeline::get_emotion_trend,
        handlers::timeline::get_knowledge_evolution,
        handlers::timeline::get_branch_triggers,
        handlers::timeline::get_insights,
        handlers::chunks::create_chunk,
        handlers::chunks::delete_chunks,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        // Timeline
        dto::timeline::TimelineEventResponse,
        dto::timeline::TopicSpikesResponse,
        dto::timeline::SentimentLabelDto,
        dto::timeline::EmotionPointResponse,
        dto::timeline::TopicNodeType,
        dto::timeline::TopicEdgeType,
        dto::timeline::TopicNodeResponse,
        dto::timeline::TopicEdgeResponse,
        dto::timeline::NewBranchResponse,
        dto::timeline::KnowledgeEvolutionResponse,
        dto::timeline::BranchTriggerResponse,
        dto::timeline::InsightsResponse,
        // Chunks
        dto::chunks::CreateChunkRequest,
        dto::chunks::ChunkResponse,
        dto::chunks::DeleteChunksResponse,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::DatabaseStatus,
        handlers::health::EmbeddingsStatus,
        handlers::health::LlmStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "timeline", description = "Per-user timeline analytics"),
        (name = "chunks", description = "Content ingestion"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
