use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::v1_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let timeline = Router::new()
        .route("/events", get(handlers::timeline::get_events))
        .route("/topic-spikes", get(handlers::timeline::get_topic_spikes))
        .route("/emotion-trend", get(handlers::timeline::get_emotion_trend))
        .route(
            "/knowledge-evolution",
            get(handlers::timeline::get_knowledge_evolution),
        )
        .route(
            "/branch-triggers",
            get(handlers::timeline::get_branch_triggers),
        )
        .route("/insights", get(handlers::timeline::get_insights));

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let protected_routes = Router::new()
        .nest("/timeline", timeline)
        .route(
            "/chunks",
            post(handlers::chunks::create_chunk).delete(handlers::chunks::delete_chunks),
        )
        .route_layer(middleware::from_fn_with_state(state, v1_auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
