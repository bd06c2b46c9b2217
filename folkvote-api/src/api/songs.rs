//! Song endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use folkvote_common::db::models::Song;
use serde::Deserialize;
use uuid::Uuid;

use super::{error_response, AppState, ErrorResponse};
use crate::db;

/// Create song request body
#[derive(Debug, Deserialize)]
pub struct CreateSongRequest {
    pub title: String,
    pub artist: String,
    pub year: Option<i64>,
}

pub async fn create_song(
    State(state): State<AppState>,
    Json(req): Json<CreateSongRequest>,
) -> Result<Json<Song>, (StatusCode, Json<ErrorResponse>)> {
    let song = db::songs::create_song(
        &state.pool,
        db::songs::NewSong {
            title: req.title,
            artist: req.artist,
            year: req.year,
        },
    )
    .await
    .map_err(error_response)?;

    Ok(Json(song))
}

pub async fn list_songs(
    State(state): State<AppState>,
) -> Result<Json<Vec<Song>>, (StatusCode, Json<ErrorResponse>)> {
    let songs = db::songs::list_songs(&state.pool)
        .await
        .map_err(error_response)?;
    Ok(Json(songs))
}

/// Fetch a song by id or by slug
pub async fn get_song(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<Song>, (StatusCode, Json<ErrorResponse>)> {
    let song = match Uuid::parse_str(&id_or_slug) {
        Ok(id) => db::songs::get_song(&state.pool, id).await,
        Err(_) => db::songs::get_song_by_slug(&state.pool, &id_or_slug).await,
    }
    .map_err(error_response)?;

    Ok(Json(song))
}

pub async fn delete_song(
    State(state): State<AppState>,
    Path(song_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    db::songs::delete_song(&state.pool, song_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
