//! Ranking queries
//!
//! Read-only aggregation views computed at request time from the maintained
//! aggregates; no materialized cache sits in between. Ranks are 1-based
//! positions in the returned ordering - ties get sequential ranks, not
//! dense ranks.

use folkvote_common::db::models::{cover_from_row, song_from_row, user_from_row, Cover, Song, User};
use folkvote_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

#[derive(Debug, Clone, Serialize)]
pub struct RankedCover {
    pub cover: Cover,
    pub rank: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedSong {
    pub song: Song,
    pub total_score: i64,
    pub rank: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedContributor {
    pub user: User,
    pub covers_count: i64,
    pub total_score: i64,
    pub rank: i64,
}

/// Top covers by score, most recent winning ties
pub async fn top_covers(pool: &SqlitePool, limit: u32) -> Result<Vec<RankedCover>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM covers
        ORDER BY votes_score DESC, created_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(RankedCover {
                cover: cover_from_row(row)?,
                rank: i as i64 + 1,
            })
        })
        .collect()
}

/// Top songs by the summed score of their covers
///
/// Songs with no covers still appear, with a total of zero. Equal totals
/// order by song recency.
pub async fn top_songs(pool: &SqlitePool, limit: u32) -> Result<Vec<RankedSong>> {
    let rows = sqlx::query(
        r#"
        SELECT s.*, COALESCE(SUM(c.votes_score), 0) AS total_score
        FROM songs s
        LEFT JOIN covers c ON c.song_id = s.id
        GROUP BY s.id
        ORDER BY total_score DESC, s.created_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(RankedSong {
                song: song_from_row(row)?,
                total_score: row.get("total_score"),
                rank: i as i64 + 1,
            })
        })
        .collect()
}

/// Top contributors by the summed score of their submitted covers
///
/// Users who never submitted a cover are excluded, however many votes they
/// cast. Equal totals order by number of submitted covers.
pub async fn top_contributors(pool: &SqlitePool, limit: u32) -> Result<Vec<RankedContributor>> {
    let rows = sqlx::query(
        r#"
        SELECT u.*, COUNT(c.id) AS covers_count, COALESCE(SUM(c.votes_score), 0) AS total_score
        FROM users u
        INNER JOIN covers c ON c.submitter_id = u.id
        GROUP BY u.id
        ORDER BY total_score DESC, covers_count DESC
        LIMIT ?
        "#,
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(RankedContributor {
                user: user_from_row(row)?,
                covers_count: row.get("covers_count"),
                total_score: row.get("total_score"),
                rank: i as i64 + 1,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_util::{new_cover, seed_cover, seed_song, seed_user, setup_pool};
    use crate::db::covers::create_cover;
    use folkvote_common::events::EventBus;
    use uuid::Uuid;

    /// Force a cover's score directly; rankings read the aggregates as-is
    async fn set_score(pool: &sqlx::SqlitePool, cover_id: Uuid, score: i64) {
        sqlx::query("UPDATE covers SET votes_score = ? WHERE id = ?")
            .bind(score)
            .bind(cover_id.to_string())
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_top_covers_orders_by_score() {
        let pool = setup_pool().await;
        let events = EventBus::new(16);
        let song = seed_song(&pool, "Barbara Allen").await;

        let c100 = seed_cover(&pool, &events, song.id, None).await;
        let c50 = seed_cover(&pool, &events, song.id, None).await;
        let c200 = seed_cover(&pool, &events, song.id, None).await;
        set_score(&pool, c100.id, 100).await;
        set_score(&pool, c50.id, 50).await;
        set_score(&pool, c200.id, 200).await;

        let top = top_covers(&pool, 2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].cover.id, c200.id);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[1].cover.id, c100.id);
        assert_eq!(top[1].rank, 2);
    }

    #[tokio::test]
    async fn test_top_covers_tie_breaks_by_recency() {
        let pool = setup_pool().await;
        let events = EventBus::new(16);
        let song = seed_song(&pool, "Barbara Allen").await;

        let older = seed_cover(&pool, &events, song.id, None).await;
        let newer = seed_cover(&pool, &events, song.id, None).await;
        set_score(&pool, older.id, 10).await;
        set_score(&pool, newer.id, 10).await;

        let top = top_covers(&pool, 10).await.unwrap();
        assert_eq!(top[0].cover.id, newer.id);
        assert_eq!(top[1].cover.id, older.id);
        // Sequential ranks even on tied scores
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[1].rank, 2);
    }

    #[tokio::test]
    async fn test_top_songs_includes_coverless_songs() {
        let pool = setup_pool().await;
        let events = EventBus::new(16);

        let song_a = seed_song(&pool, "Barbara Allen").await;
        let ca1 = seed_cover(&pool, &events, song_a.id, None).await;
        let ca2 = seed_cover(&pool, &events, song_a.id, None).await;
        set_score(&pool, ca1.id, 100).await;
        set_score(&pool, ca2.id, 50).await;

        let song_b = seed_song(&pool, "Greensleeves").await;

        let top = top_songs(&pool, 10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].song.id, song_a.id);
        assert_eq!(top[0].total_score, 150);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[1].song.id, song_b.id);
        assert_eq!(top[1].total_score, 0);
        assert_eq!(top[1].rank, 2);
    }

    #[tokio::test]
    async fn test_top_songs_tie_breaks_by_song_recency() {
        let pool = setup_pool().await;
        let events = EventBus::new(16);

        let older = seed_song(&pool, "Barbara Allen").await;
        let newer = seed_song(&pool, "Greensleeves").await;
        let co = seed_cover(&pool, &events, older.id, None).await;
        let cn = seed_cover(&pool, &events, newer.id, None).await;
        set_score(&pool, co.id, 25).await;
        set_score(&pool, cn.id, 25).await;

        let top = top_songs(&pool, 10).await.unwrap();
        assert_eq!(top[0].song.id, newer.id);
        assert_eq!(top[1].song.id, older.id);
    }

    #[tokio::test]
    async fn test_top_contributors_excludes_non_submitters() {
        let pool = setup_pool().await;
        let events = EventBus::new(16);
        let submitter = seed_user(&pool, "alice").await;
        let voter_only = seed_user(&pool, "bob").await;
        let song = seed_song(&pool, "Barbara Allen").await;
        let cover = seed_cover(&pool, &events, song.id, Some(submitter.id)).await;

        // bob votes but never submits
        crate::db::votes::cast_vote(&pool, &events, voter_only.id, cover.id, 1)
            .await
            .unwrap();

        let top = top_contributors(&pool, 10).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].user.id, submitter.id);
        assert_eq!(top[0].covers_count, 1);
        assert_eq!(top[0].total_score, 1);
        assert_eq!(top[0].rank, 1);
    }

    #[tokio::test]
    async fn test_top_contributors_tie_breaks_by_covers_count() {
        let pool = setup_pool().await;
        let events = EventBus::new(16);
        let prolific = seed_user(&pool, "alice").await;
        let focused = seed_user(&pool, "bob").await;
        let song = seed_song(&pool, "Barbara Allen").await;

        // Same total score (30), different cover counts
        let a1 = create_cover(&pool, &events, new_cover(song.id, Some(prolific.id))).await.unwrap();
        let a2 = create_cover(&pool, &events, new_cover(song.id, Some(prolific.id))).await.unwrap();
        let b1 = create_cover(&pool, &events, new_cover(song.id, Some(focused.id))).await.unwrap();
        set_score(&pool, a1.id, 20).await;
        set_score(&pool, a2.id, 10).await;
        set_score(&pool, b1.id, 30).await;

        let top = top_contributors(&pool, 10).await.unwrap();
        assert_eq!(top[0].user.id, prolific.id);
        assert_eq!(top[0].covers_count, 2);
        assert_eq!(top[1].user.id, focused.id);
        assert_eq!(top[1].covers_count, 1);
    }

    #[tokio::test]
    async fn test_limits_are_applied() {
        let pool = setup_pool().await;
        let events = EventBus::new(16);
        let song = seed_song(&pool, "Barbara Allen").await;
        for _ in 0..5 {
            seed_cover(&pool, &events, song.id, None).await;
        }

        assert_eq!(top_covers(&pool, 3).await.unwrap().len(), 3);
        assert_eq!(top_songs(&pool, 10).await.unwrap().len(), 1);
    }
}
