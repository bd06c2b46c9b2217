//! Cover endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use folkvote_common::db::models::Cover;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{error_response, AppState, ErrorResponse};
use crate::db;
use crate::db::covers::CoverSort;

/// Create cover request body
#[derive(Debug, Deserialize)]
pub struct CreateCoverRequest {
    pub song_id: Uuid,
    pub submitter_id: Option<Uuid>,
    pub artist: String,
    pub year: Option<i64>,
    pub media_url: String,
    #[serde(default)]
    pub original: bool,
}

/// Cover listing query parameters
#[derive(Debug, Deserialize)]
pub struct ListCoversParams {
    pub sorted_by: Option<CoverSort>,
}

/// Recalculate response
#[derive(Debug, Serialize)]
pub struct RecalculateResponse {
    pub votes_score: i64,
    pub votes_count: i64,
}

pub async fn create_cover(
    State(state): State<AppState>,
    Json(req): Json<CreateCoverRequest>,
) -> Result<Json<Cover>, (StatusCode, Json<ErrorResponse>)> {
    let cover = db::covers::create_cover(
        &state.pool,
        &state.events,
        db::covers::NewCover {
            song_id: req.song_id,
            submitter_id: req.submitter_id,
            artist: req.artist,
            year: req.year,
            media_url: req.media_url,
            original: req.original,
        },
    )
    .await
    .map_err(error_response)?;

    Ok(Json(cover))
}

pub async fn get_cover(
    State(state): State<AppState>,
    Path(cover_id): Path<Uuid>,
) -> Result<Json<Cover>, (StatusCode, Json<ErrorResponse>)> {
    let cover = db::covers::get_cover(&state.pool, cover_id)
        .await
        .map_err(error_response)?;
    Ok(Json(cover))
}

pub async fn delete_cover(
    State(state): State<AppState>,
    Path(cover_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    db::covers::delete_cover(&state.pool, cover_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Recompute a cover's aggregates from the vote ledger
pub async fn recalculate(
    State(state): State<AppState>,
    Path(cover_id): Path<Uuid>,
) -> Result<Json<RecalculateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (votes_score, votes_count) = db::covers::recalculate(&state.pool, cover_id)
        .await
        .map_err(error_response)?;

    Ok(Json(RecalculateResponse {
        votes_score,
        votes_count,
    }))
}

/// Make this cover its song's one original recording (admin operation)
pub async fn mark_as_original(
    State(state): State<AppState>,
    Path(cover_id): Path<Uuid>,
) -> Result<Json<Cover>, (StatusCode, Json<ErrorResponse>)> {
    let cover = db::covers::mark_as_original(&state.pool, cover_id)
        .await
        .map_err(error_response)?;
    Ok(Json(cover))
}

pub async fn list_covers_for_song(
    State(state): State<AppState>,
    Path(song_id): Path<Uuid>,
    Query(params): Query<ListCoversParams>,
) -> Result<Json<Vec<Cover>>, (StatusCode, Json<ErrorResponse>)> {
    let sort = params.sorted_by.unwrap_or(CoverSort::Score);
    let covers = db::covers::list_covers_for_song(&state.pool, song_id, sort)
        .await
        .map_err(error_response)?;
    Ok(Json(covers))
}
