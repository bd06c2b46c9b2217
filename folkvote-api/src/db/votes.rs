//! Vote ledger operations
//!
//! One vote per (user, cover) pair, enforced by a unique index. Casting is
//! create / flip-in-place / toggle-off depending on the existing vote, and
//! every outcome recomputes the cover's aggregates inside the same
//! transaction.

use chrono::Utc;
use folkvote_common::db::models::{cover_from_row, Cover};
use folkvote_common::events::{EventBus, NotificationEvent};
use folkvote_common::{Error, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::covers::apply_aggregates;

/// What a cast did to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Created,
    Updated,
    Removed,
}

/// Result of a cast: the action taken and the cover's fresh aggregates
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub action: VoteAction,
    pub cover: Cover,
}

/// Cast a user's vote on a cover
///
/// No existing vote creates one; repeating the same value toggles the vote
/// off; the opposite value flips it in place. Two requests racing to create
/// the first vote for a pair are serialized by the unique index: the loser
/// re-reads and retries as update-or-toggle.
pub async fn cast_vote(
    pool: &SqlitePool,
    events: &EventBus,
    user_id: Uuid,
    cover_id: Uuid,
    value: i64,
) -> Result<VoteOutcome> {
    if value != 1 && value != -1 {
        return Err(Error::InvalidInput(
            "vote value must be +1 or -1".to_string(),
        ));
    }

    let outcome = match try_cast(pool, user_id, cover_id, value).await {
        Err(err) if err.is_unique_violation() => {
            debug!("Lost a concurrent first-vote race on cover {cover_id}, retrying");
            try_cast(pool, user_id, cover_id, value).await.map_err(|e| {
                if e.is_unique_violation() {
                    Error::Conflict(format!("concurrent vote on cover {cover_id}"))
                } else {
                    e
                }
            })?
        }
        other => other?,
    };

    if outcome.action == VoteAction::Created {
        if let Some(submitter_id) = outcome.cover.submitter_id {
            if submitter_id != user_id {
                events.emit_lossy(NotificationEvent::VoteReceived {
                    submitter_id,
                    voter_id: user_id,
                    cover_id,
                    value,
                    timestamp: Utc::now(),
                });
            }
        }
    }

    Ok(outcome)
}

async fn try_cast(
    pool: &SqlitePool,
    user_id: Uuid,
    cover_id: Uuid,
    value: i64,
) -> Result<VoteOutcome> {
    let mut tx = pool.begin().await?;

    let cover = sqlx::query("SELECT id FROM covers WHERE id = ?")
        .bind(cover_id.to_string())
        .fetch_optional(&mut *tx)
        .await?;
    if cover.is_none() {
        return Err(Error::NotFound(format!("cover {cover_id}")));
    }

    let existing = sqlx::query("SELECT id, value FROM votes WHERE user_id = ? AND cover_id = ?")
        .bind(user_id.to_string())
        .bind(cover_id.to_string())
        .fetch_optional(&mut *tx)
        .await?;

    let now = Utc::now();
    let action = match existing {
        None => {
            sqlx::query(
                r#"
                INSERT INTO votes (id, user_id, cover_id, value, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id.to_string())
            .bind(cover_id.to_string())
            .bind(value)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            VoteAction::Created
        }
        Some(row) => {
            let vote_id: String = row.get("id");
            let existing_value: i64 = row.get("value");

            if existing_value == value {
                sqlx::query("DELETE FROM votes WHERE id = ?")
                    .bind(&vote_id)
                    .execute(&mut *tx)
                    .await?;
                VoteAction::Removed
            } else {
                sqlx::query("UPDATE votes SET value = ?, updated_at = ? WHERE id = ?")
                    .bind(value)
                    .bind(now)
                    .bind(&vote_id)
                    .execute(&mut *tx)
                    .await?;
                VoteAction::Updated
            }
        }
    };

    apply_aggregates(&mut tx, cover_id).await?;

    let row = sqlx::query("SELECT * FROM covers WHERE id = ?")
        .bind(cover_id.to_string())
        .fetch_one(&mut *tx)
        .await?;
    let cover = cover_from_row(&row)?;

    tx.commit().await?;

    debug!(
        "Vote {:?} by user {} on cover {} (score {}, count {})",
        action, user_id, cover_id, cover.votes_score, cover.votes_count
    );
    Ok(VoteOutcome { action, cover })
}

/// Remove a user's vote from a cover
///
/// Returns the cover's fresh aggregates; `NotFound` when no vote exists.
pub async fn remove_vote(pool: &SqlitePool, user_id: Uuid, cover_id: Uuid) -> Result<Cover> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("DELETE FROM votes WHERE user_id = ? AND cover_id = ?")
        .bind(user_id.to_string())
        .bind(cover_id.to_string())
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "vote by user {user_id} on cover {cover_id}"
        )));
    }

    apply_aggregates(&mut tx, cover_id).await?;

    let row = sqlx::query("SELECT * FROM covers WHERE id = ?")
        .bind(cover_id.to_string())
        .fetch_one(&mut *tx)
        .await?;
    let cover = cover_from_row(&row)?;

    tx.commit().await?;
    Ok(cover)
}

/// A user's current vote value on a cover, if any
pub async fn get_user_vote(
    pool: &SqlitePool,
    user_id: Uuid,
    cover_id: Uuid,
) -> Result<Option<i64>> {
    let row = sqlx::query("SELECT value FROM votes WHERE user_id = ? AND cover_id = ?")
        .bind(user_id.to_string())
        .bind(cover_id.to_string())
        .fetch_optional(pool)
        .await?;

    if let Some(row) = row {
        return Ok(Some(row.get("value")));
    }

    let cover = sqlx::query("SELECT id FROM covers WHERE id = ?")
        .bind(cover_id.to_string())
        .fetch_optional(pool)
        .await?;
    if cover.is_none() {
        return Err(Error::NotFound(format!("cover {cover_id}")));
    }

    Ok(None)
}

/// Distinct users who voted on a song's covers, optionally excluding one
/// cover (the freshly-created one, for new-cover notification fan-out)
pub async fn voter_ids_for_song(
    pool: &SqlitePool,
    song_id: Uuid,
    exclude_cover: Option<Uuid>,
) -> Result<Vec<Uuid>> {
    let exclude = exclude_cover.map(|id| id.to_string());
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT v.user_id AS user_id
        FROM votes v
        INNER JOIN covers c ON c.id = v.cover_id
        WHERE c.song_id = ? AND (? IS NULL OR v.cover_id <> ?)
        "#,
    )
    .bind(song_id.to_string())
    .bind(&exclude)
    .bind(&exclude)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let id: String = row.get("user_id");
            Uuid::parse_str(&id)
                .map_err(|e| Error::Internal(format!("invalid uuid in database: {e}")))
        })
        .collect()
}
