//! Vote endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use folkvote_common::db::models::Cover;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{error_response, AppState, ErrorResponse};
use crate::db;
use crate::db::votes::VoteOutcome;

/// Cast vote request body
#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    pub user_id: Uuid,
    /// +1 or -1
    pub value: i64,
}

/// Current vote value response
#[derive(Debug, Serialize)]
pub struct VoteValueResponse {
    pub value: Option<i64>,
}

/// Remove vote response
#[derive(Debug, Serialize)]
pub struct RemoveVoteResponse {
    pub cover: Cover,
}

pub async fn cast_vote(
    State(state): State<AppState>,
    Path(cover_id): Path<Uuid>,
    Json(req): Json<CastVoteRequest>,
) -> Result<Json<VoteOutcome>, (StatusCode, Json<ErrorResponse>)> {
    let outcome = db::votes::cast_vote(&state.pool, &state.events, req.user_id, cover_id, req.value)
        .await
        .map_err(error_response)?;
    Ok(Json(outcome))
}

pub async fn get_user_vote(
    State(state): State<AppState>,
    Path((cover_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<VoteValueResponse>, (StatusCode, Json<ErrorResponse>)> {
    let value = db::votes::get_user_vote(&state.pool, user_id, cover_id)
        .await
        .map_err(error_response)?;
    Ok(Json(VoteValueResponse { value }))
}

pub async fn remove_vote(
    State(state): State<AppState>,
    Path((cover_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RemoveVoteResponse>, (StatusCode, Json<ErrorResponse>)> {
    let cover = db::votes::remove_vote(&state.pool, user_id, cover_id)
        .await
        .map_err(error_response)?;
    Ok(Json(RemoveVoteResponse { cover }))
}
