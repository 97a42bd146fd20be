//! v1 Timeline handlers.
//!
//! Every handler reads the authenticated user from the request extension;
//! storage failures surface as empty results, not errors.

use axum::extract::State;
use axum::Extension;

use crate::api::v1::dto::{
    BranchTriggerResponse, EmotionPointResponse, InsightsResponse, KnowledgeEvolutionResponse,
    TimelineEventResponse, TopicSpikesResponse,
};
use crate::api::v1::middleware::AuthenticatedUser;
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;

/// `GET /api/v1/timeline/events`
#[utoipa::path(
    get,
    path = "/api/v1/timeline/events",
    tag = "timeline",
    operation_id = "timeline.events",
    responses(
        (status = 200, description = "Chunks in chronological order", body = Vec<TimelineEventResponse>),
        (status = 401, description = "Missing credentials", body = ApiError),
        (status = 403, description = "Unknown API key", body = ApiError),
    )
)]
pub async fn get_events(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
) -> ApiResponse<Vec<TimelineEventResponse>> {
    let events = state.timeline.events(&user_id).await;
    ApiResponse::success(events.into_iter().map(Into::into).collect())
}

/// `GET /api/v1/timeline/topic-spikes`
#[utoipa::path(
    get,
    path = "/api/v1/timeline/topic-spikes",
    tag = "timeline",
    operation_id = "timeline.topicSpikes",
    responses(
        (status = 200, description = "Per-month topic counts", body = TopicSpikesResponse),
        (status = 401, description = "Missing credentials", body = ApiError),
        (status = 403, description = "Unknown API key", body = ApiError),
    )
)]
pub async fn get_topic_spikes(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
) -> ApiResponse<TopicSpikesResponse> {
    ApiResponse::success(TopicSpikesResponse(
        state.timeline.topic_spikes(&user_id).await,
    ))
}

/// `GET /api/v1/timeline/emotion-trend`
#[utoipa::path(
    get,
    path = "/api/v1/timeline/emotion-trend",
    tag = "timeline",
    operation_id = "timeline.emotionTrend",
    responses(
        (status = 200, description = "Sentiment per chunk with text", body = Vec<EmotionPointResponse>),
        (status = 401, description = "Missing credentials", body = ApiError),
        (status = 403, description = "Unknown API key", body = ApiError),
    )
)]
pub async fn get_emotion_trend(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
) -> ApiResponse<Vec<EmotionPointResponse>> {
    let trend = state.timeline.emotion_trend(&user_id).await;
    ApiResponse::success(trend.into_iter().map(Into::into).collect())
}

/// `GET /api/v1/timeline/knowledge-evolution`
#[utoipa::path(
    get,
    path = "/api/v1/timeline/knowledge-evolution",
    tag = "timeline",
    operation_id = "timeline.knowledgeEvolution",
    responses(
        (status = 200, description = "Topic co-occurrence graph", body = KnowledgeEvolutionResponse),
        (status = 401, description = "Missing credentials", body = ApiError),
        (status = 403, description = "Unknown API key", body = ApiError),
    )
)]
pub async fn get_knowledge_evolution(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
) -> ApiResponse<KnowledgeEvolutionResponse> {
    let evolution = state.timeline.knowledge_evolution(&user_id).await;
    ApiResponse::success(evolution.into())
}

/// `GET /api/v1/timeline/branch-triggers`
#[utoipa::path(
    get,
    path = "/api/v1/timeline/branch-triggers",
    tag = "timeline",
    operation_id = "timeline.branchTriggers",
    responses(
        (status = 200, description = "Chunks that started a new line of interest", body = Vec<BranchTriggerResponse>),
        (status = 401, description = "Missing credentials", body = ApiError),
        (status = 403, description = "Unknown API key", body = ApiError),
        (status = 500, description = "Embedding provider returned inconsistent vectors", body = ApiError),
    )
)]
pub async fn get_branch_triggers(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
) -> ApiResponse<Vec<BranchTriggerResponse>> {
    match state.timeline.branch_triggers(&user_id).await {
        Ok(triggers) => ApiResponse::success(triggers.into_iter().map(Into::into).collect()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/timeline/insights`
#[utoipa::path(
    get,
    path = "/api/v1/timeline/insights",
    tag = "timeline",
    operation_id = "timeline.insights",
    responses(
        (status = 200, description = "Short narrative about the timeline", body = InsightsResponse),
        (status = 401, description = "Missing credentials", body = ApiError),
        (status = 403, description = "Unknown API key", body = ApiError),
    )
)]
pub async fn get_insights(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
) -> ApiResponse<InsightsResponse> {
    let insights = state.timeline.insights(&user_id).await;
    ApiResponse::success(InsightsResponse { insights })
}
