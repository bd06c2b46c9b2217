//! User endpoints

use axum::{extract::State, http::StatusCode, response::Json};
use folkvote_common::db::models::{Role, User};
use serde::Deserialize;

use super::{error_response, AppState, ErrorResponse};
use crate::db;

/// Create user request body
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    /// Absent for externally-authenticated accounts
    pub password: Option<String>,
    pub role: Option<Role>,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<User>, (StatusCode, Json<ErrorResponse>)> {
    let user = db::users::create_user(
        &state.pool,
        db::users::NewUser {
            email: req.email,
            username: req.username,
            password: req.password,
            role: req.role.unwrap_or(Role::User),
        },
    )
    .await
    .map_err(error_response)?;

    Ok(Json(user))
}
