//! Ranking endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use super::{error_response, AppState, ErrorResponse};
use crate::db;
use crate::db::rankings::{RankedContributor, RankedCover, RankedSong};

const DEFAULT_LIMIT: u32 = 10;

/// Ranking query parameters
#[derive(Debug, Deserialize)]
pub struct RankingParams {
    pub limit: Option<u32>,
}

pub async fn top_covers(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<Json<Vec<RankedCover>>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let ranked = db::rankings::top_covers(&state.pool, limit)
        .await
        .map_err(error_response)?;
    Ok(Json(ranked))
}

pub async fn top_songs(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<Json<Vec<RankedSong>>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let ranked = db::rankings::top_songs(&state.pool, limit)
        .await
        .map_err(error_response)?;
    Ok(Json(ranked))
}

pub async fn top_contributors(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<Json<Vec<RankedContributor>>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let ranked = db::rankings::top_contributors(&state.pool, limit)
        .await
        .map_err(error_response)?;
    Ok(Json(ranked))
}
