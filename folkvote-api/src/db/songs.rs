//! Song database operations

use chrono::Utc;
use folkvote_common::db::models::{song_from_row, Song};
use folkvote_common::slug::unique_slug;
use folkvote_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

/// New song input
#[derive(Debug, Clone)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub year: Option<i64>,
}

/// Create a new song
///
/// The slug is derived from title and artist before first persistence and
/// never recomputed on later edits. The slug column's UNIQUE constraint is
/// the authority under concurrent creation of same-titled songs: losing a
/// race re-derives the slug and retries the insert.
pub async fn create_song(pool: &SqlitePool, new: NewSong) -> Result<Song> {
    if new.title.trim().is_empty() {
        return Err(Error::InvalidInput("song title is required".to_string()));
    }
    if new.artist.trim().is_empty() {
        return Err(Error::InvalidInput("song artist is required".to_string()));
    }

    let mut attempts = 0;
    loop {
        let slug = unique_slug(pool, "songs", &[&new.title, &new.artist]).await?;
        let now = Utc::now();
        let song = Song {
            id: Uuid::new_v4(),
            title: new.title.clone(),
            artist: new.artist.clone(),
            year: new.year,
            slug,
            covers_count: 0,
            created_at: now,
            updated_at: now,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO songs (id, title, artist, year, slug, covers_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(song.id.to_string())
        .bind(&song.title)
        .bind(&song.artist)
        .bind(song.year)
        .bind(&song.slug)
        .bind(song.created_at)
        .bind(song.updated_at)
        .execute(pool)
        .await;

        match result {
            Ok(_) => {
                info!("Created song '{}' as /{}", song.title, song.slug);
                return Ok(song);
            }
            Err(e) => {
                let err = Error::from(e);
                attempts += 1;
                if err.is_unique_violation() && attempts < 3 {
                    debug!("Slug '{}' taken concurrently, retrying", song.slug);
                    continue;
                }
                if err.is_unique_violation() {
                    return Err(Error::Conflict(format!("slug '{}' already taken", song.slug)));
                }
                return Err(err);
            }
        }
    }
}

/// Load song by id
pub async fn get_song(pool: &SqlitePool, song_id: Uuid) -> Result<Song> {
    let row = sqlx::query("SELECT * FROM songs WHERE id = ?")
        .bind(song_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => song_from_row(&row),
        None => Err(Error::NotFound(format!("song {song_id}"))),
    }
}

/// Load song by slug
pub async fn get_song_by_slug(pool: &SqlitePool, slug: &str) -> Result<Song> {
    let row = sqlx::query("SELECT * FROM songs WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => song_from_row(&row),
        None => Err(Error::NotFound(format!("song '{slug}'"))),
    }
}

/// List all songs, ordered by title
pub async fn list_songs(pool: &SqlitePool) -> Result<Vec<Song>> {
    let rows = sqlx::query("SELECT * FROM songs ORDER BY title ASC")
        .fetch_all(pool)
        .await?;

    rows.iter().map(song_from_row).collect()
}

/// Delete a song; its covers and their votes cascade
pub async fn delete_song(pool: &SqlitePool, song_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM songs WHERE id = ?")
        .bind(song_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("song {song_id}")));
    }

    info!("Deleted song {}", song_id);
    Ok(())
}
