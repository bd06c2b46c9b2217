//! Shared helpers for db module tests

use folkvote_common::db::create_schema;
use folkvote_common::db::models::{Cover, Role, Song, User};
use folkvote_common::events::EventBus;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::covers::{self, NewCover};
use super::songs::{self, NewSong};
use super::users::{self, NewUser};

/// In-memory database with the full schema
///
/// A single connection, so every query sees the same in-memory database.
pub(crate) async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();
    create_schema(&pool).await.unwrap();
    pool
}

pub(crate) async fn seed_user(pool: &SqlitePool, username: &str) -> User {
    users::create_user(
        pool,
        NewUser {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            password: Some("hunter2".to_string()),
            role: Role::User,
        },
    )
    .await
    .unwrap()
}

pub(crate) async fn seed_song(pool: &SqlitePool, title: &str) -> Song {
    songs::create_song(
        pool,
        NewSong {
            title: title.to_string(),
            artist: "Traditional".to_string(),
            year: None,
        },
    )
    .await
    .unwrap()
}

pub(crate) fn new_cover(song_id: Uuid, submitter_id: Option<Uuid>) -> NewCover {
    NewCover {
        song_id,
        submitter_id,
        artist: "The Wandering Minstrels".to_string(),
        year: Some(1972),
        media_url: "https://media.example.com/cover.mp3".to_string(),
        original: false,
    }
}

pub(crate) async fn seed_cover(
    pool: &SqlitePool,
    events: &EventBus,
    song_id: Uuid,
    submitter_id: Option<Uuid>,
) -> Cover {
    covers::create_cover(pool, events, new_cover(song_id, submitter_id))
        .await
        .unwrap()
}

pub(crate) async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    let query = format!("SELECT COUNT(*) AS n FROM {table}");
    sqlx::query(&query).fetch_one(pool).await.unwrap().get("n")
}
