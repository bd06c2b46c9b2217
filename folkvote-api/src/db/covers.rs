//! Cover database operations and aggregate maintenance
//!
//! `votes_score`/`votes_count` on each cover are denormalized from the vote
//! ledger and recomputed inside the same transaction as any vote mutation.
//! `songs.covers_count` is a running counter kept in step by cover
//! creation/deletion, never rebuilt from a scan on the read path.

use chrono::Utc;
use folkvote_common::db::models::{cover_from_row, Cover};
use folkvote_common::events::{EventBus, NotificationEvent};
use folkvote_common::{Error, Result};
use serde::Deserialize;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

/// New cover input
#[derive(Debug, Clone)]
pub struct NewCover {
    pub song_id: Uuid,
    pub submitter_id: Option<Uuid>,
    pub artist: String,
    pub year: Option<i64>,
    pub media_url: String,
    pub original: bool,
}

/// Sort mode for cover listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverSort {
    Score,
    Recent,
}

/// Shared ordering policy for all cover listings: the original recording
/// first, then the requested secondary key, most recent winning ties.
fn order_clause(sort: CoverSort) -> &'static str {
    match sort {
        CoverSort::Score => "ORDER BY original DESC, votes_score DESC, created_at DESC",
        CoverSort::Recent => "ORDER BY original DESC, created_at DESC",
    }
}

/// Create a new cover and bump its song's cover counter
///
/// Emits `NewCoverOnSong` after commit; the notification subsystem fans it
/// out to prior voters on the song's other covers.
pub async fn create_cover(pool: &SqlitePool, events: &EventBus, new: NewCover) -> Result<Cover> {
    if new.media_url.trim().is_empty() {
        return Err(Error::InvalidInput("a playable media URL is required".to_string()));
    }

    let mut tx = pool.begin().await?;

    let song = sqlx::query("SELECT id FROM songs WHERE id = ?")
        .bind(new.song_id.to_string())
        .fetch_optional(&mut *tx)
        .await?;
    if song.is_none() {
        return Err(Error::NotFound(format!("song {}", new.song_id)));
    }

    let now = Utc::now();
    let cover = Cover {
        id: Uuid::new_v4(),
        song_id: new.song_id,
        submitter_id: new.submitter_id,
        artist: new.artist,
        year: new.year,
        media_url: new.media_url,
        votes_score: 0,
        votes_count: 0,
        original: new.original,
        created_at: now,
        updated_at: now,
    };

    let result = sqlx::query(
        r#"
        INSERT INTO covers (id, song_id, submitter_id, artist, year, media_url,
                            votes_score, votes_count, original, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, 0, ?, ?, ?)
        "#,
    )
    .bind(cover.id.to_string())
    .bind(cover.song_id.to_string())
    .bind(cover.submitter_id.map(|id| id.to_string()))
    .bind(&cover.artist)
    .bind(cover.year)
    .bind(&cover.media_url)
    .bind(cover.original)
    .bind(cover.created_at)
    .bind(cover.updated_at)
    .execute(&mut *tx)
    .await;

    if let Err(e) = result {
        let err = Error::from(e);
        if err.is_unique_violation() {
            return Err(Error::Conflict(
                "song already has an original cover".to_string(),
            ));
        }
        return Err(err);
    }

    sqlx::query("UPDATE songs SET covers_count = covers_count + 1, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(cover.song_id.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Created cover {} on song {}", cover.id, cover.song_id);
    events.emit_lossy(NotificationEvent::NewCoverOnSong {
        song_id: cover.song_id,
        cover_id: cover.id,
        submitter_id: cover.submitter_id,
        timestamp: now,
    });

    Ok(cover)
}

/// Delete a cover; its votes cascade and the song's counter is decremented
pub async fn delete_cover(pool: &SqlitePool, cover_id: Uuid) -> Result<()> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query("SELECT song_id FROM covers WHERE id = ?")
        .bind(cover_id.to_string())
        .fetch_optional(&mut *tx)
        .await?;
    let song_id: String = match row {
        Some(row) => row.get("song_id"),
        None => return Err(Error::NotFound(format!("cover {cover_id}"))),
    };

    sqlx::query("DELETE FROM covers WHERE id = ?")
        .bind(cover_id.to_string())
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE songs SET covers_count = covers_count - 1, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(&song_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Deleted cover {} from song {}", cover_id, song_id);
    Ok(())
}

/// Recompute a cover's aggregates from the vote ledger, within `conn`
///
/// `votes_score` becomes the sum of vote values, `votes_count` the count.
pub(crate) async fn apply_aggregates(conn: &mut SqliteConnection, cover_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE covers SET
            votes_score = COALESCE((SELECT SUM(value) FROM votes WHERE cover_id = covers.id), 0),
            votes_count = (SELECT COUNT(*) FROM votes WHERE cover_id = covers.id),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(Utc::now())
    .bind(cover_id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Recompute and persist a cover's aggregates
///
/// Idempotent; callable independently of the vote ledger as a repair
/// operation after bulk data loads. Returns the fresh
/// `(votes_score, votes_count)` pair.
pub async fn recalculate(pool: &SqlitePool, cover_id: Uuid) -> Result<(i64, i64)> {
    let mut tx = pool.begin().await?;

    let exists = sqlx::query("SELECT id FROM covers WHERE id = ?")
        .bind(cover_id.to_string())
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(Error::NotFound(format!("cover {cover_id}")));
    }

    apply_aggregates(&mut tx, cover_id).await?;

    let row = sqlx::query("SELECT votes_score, votes_count FROM covers WHERE id = ?")
        .bind(cover_id.to_string())
        .fetch_one(&mut *tx)
        .await?;
    let aggregates = (row.get("votes_score"), row.get("votes_count"));

    tx.commit().await?;
    Ok(aggregates)
}

/// Make `cover_id` its song's one original recording
///
/// Privileged operation. Unsets any sibling original and sets the target
/// inside a single transaction, so there is no window with zero or two
/// originals.
pub async fn mark_as_original(pool: &SqlitePool, cover_id: Uuid) -> Result<Cover> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query("SELECT song_id FROM covers WHERE id = ?")
        .bind(cover_id.to_string())
        .fetch_optional(&mut *tx)
        .await?;
    let song_id: String = match row {
        Some(row) => row.get("song_id"),
        None => return Err(Error::NotFound(format!("cover {cover_id}"))),
    };

    let now = Utc::now();
    sqlx::query("UPDATE covers SET original = 0, updated_at = ? WHERE song_id = ? AND original = 1")
        .bind(now)
        .bind(&song_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE covers SET original = 1, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(cover_id.to_string())
        .execute(&mut *tx)
        .await?;

    let row = sqlx::query("SELECT * FROM covers WHERE id = ?")
        .bind(cover_id.to_string())
        .fetch_one(&mut *tx)
        .await?;
    let cover = cover_from_row(&row)?;

    tx.commit().await?;

    info!("Cover {} is now the original for song {}", cover_id, song_id);
    Ok(cover)
}

/// List a song's covers, original first
pub async fn list_covers_for_song(
    pool: &SqlitePool,
    song_id: Uuid,
    sort: CoverSort,
) -> Result<Vec<Cover>> {
    let song = sqlx::query("SELECT id FROM songs WHERE id = ?")
        .bind(song_id.to_string())
        .fetch_optional(pool)
        .await?;
    if song.is_none() {
        return Err(Error::NotFound(format!("song {song_id}")));
    }

    let query = format!("SELECT * FROM covers WHERE song_id = ? {}", order_clause(sort));
    let rows = sqlx::query(&query)
        .bind(song_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(cover_from_row).collect()
}

/// Load cover by id
pub async fn get_cover(pool: &SqlitePool, cover_id: Uuid) -> Result<Cover> {
    let row = sqlx::query("SELECT * FROM covers WHERE id = ?")
        .bind(cover_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => cover_from_row(&row),
        None => Err(Error::NotFound(format!("cover {cover_id}"))),
    }
}
