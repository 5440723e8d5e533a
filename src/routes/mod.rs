//! Router assembly: HTTP endpoints, WebSocket upgrade, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // Solo tests
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/test", post(http::http_start_test))
        .route("/api/v1/test/:id/answer", post(http::http_test_answer))
        .route("/api/v1/test/:id/complete", post(http::http_complete_test))
        .route("/api/v1/course", post(http::http_start_course))
        // Ratings
        .route("/api/v1/profile/:user_id", get(http::http_get_profile))
        .route("/api/v1/tiers", get(http::http_get_tiers))
        // Multiplayer
        .route("/api/v1/game", post(http::http_create_or_join))
        .route("/api/v1/game/:id", get(http::http_poll_game))
        .route("/api/v1/game/:id/answer", post(http::http_game_answer))
        .route("/api/v1/game/:id/abandon", post(http::http_abandon))
        .route("/api/v1/game/:id/finalize", post(http::http_finalize))
        .route("/api/v1/matchmaking/:user_id", delete(http::http_leave_search))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
