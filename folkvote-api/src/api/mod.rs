//! REST API implementation
//!
//! Thin axum plumbing over the voting core; every operation here is also
//! callable directly against the database layer.

pub mod covers;
pub mod rankings;
pub mod songs;
pub mod users;
pub mod votes;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use folkvote_common::events::EventBus;
use folkvote_common::Error;
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database pool
    pub pool: SqlitePool,
    /// Notification event bus
    pub events: Arc<EventBus>,
}

/// Error payload for non-2xx responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Translate a domain error into an HTTP response
pub(crate) fn error_response(err: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {}", err);
    }
    (status, Json(ErrorResponse { error: err.to_string() }))
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))

        // API v1 routes
        .nest("/api/v1", Router::new()
            // Users
            .route("/users", post(users::create_user))

            // Songs
            .route("/songs", post(songs::create_song).get(songs::list_songs))
            .route("/songs/:song_id", get(songs::get_song).delete(songs::delete_song))
            .route("/songs/:song_id/covers", get(covers::list_covers_for_song))

            // Covers
            .route("/covers", post(covers::create_cover))
            .route("/covers/:cover_id", get(covers::get_cover).delete(covers::delete_cover))
            .route("/covers/:cover_id/recalculate", post(covers::recalculate))
            .route("/covers/:cover_id/original", post(covers::mark_as_original))

            // Votes
            .route("/covers/:cover_id/vote", post(votes::cast_vote))
            .route(
                "/covers/:cover_id/vote/:user_id",
                get(votes::get_user_vote).delete(votes::remove_vote),
            )

            // Rankings
            .route("/rankings/covers", get(rankings::top_covers))
            .route("/rankings/songs", get(rankings::top_songs))
            .route("/rankings/contributors", get(rankings::top_contributors))
        )
        .layer(TraceLayer::new_for_http())
        // The React frontend is served from its own origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "folkvote-api",
        "version": env!("CARGO_PKG_VERSION"),
        "subscribers": state.events.subscriber_count(),
    }))
}
