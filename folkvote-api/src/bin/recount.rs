//! Aggregate repair utility
//!
//! Re-derives every cover's `votes_score`/`votes_count` from the vote
//! ledger and every song's `covers_count` from its covers. Run after bulk
//! data loads or suspected drift; the recomputation is idempotent.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use folkvote_common::config::resolve_database_path;
use folkvote_common::db::init_database;
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

use folkvote_api::db::covers;

/// Command-line arguments for recount
#[derive(Parser, Debug)]
#[command(name = "recount")]
#[command(about = "Rebuild FOLKVOTE vote aggregates and cover counters")]
#[command(version)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let db_path = resolve_database_path(args.database.as_deref())
        .context("Failed to resolve database path")?;
    info!("Database: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let rows = sqlx::query("SELECT id, votes_score, votes_count FROM covers")
        .fetch_all(&pool)
        .await?;
    let total = rows.len();
    let mut repaired = 0usize;

    for row in rows {
        let id: String = row.get("id");
        let before: (i64, i64) = (row.get("votes_score"), row.get("votes_count"));
        let cover_id = Uuid::parse_str(&id).context("invalid cover id in database")?;

        let after = covers::recalculate(&pool, cover_id).await?;
        if after != before {
            info!(
                "Cover {}: score {} -> {}, count {} -> {}",
                cover_id, before.0, after.0, before.1, after.1
            );
            repaired += 1;
        }
    }

    let result = sqlx::query(
        r#"
        UPDATE songs SET covers_count = (
            SELECT COUNT(*) FROM covers WHERE covers.song_id = songs.id
        )
        WHERE covers_count <> (
            SELECT COUNT(*) FROM covers WHERE covers.song_id = songs.id
        )
        "#,
    )
    .execute(&pool)
    .await?;

    info!(
        "Recount complete: {}/{} covers repaired, {} song counters corrected",
        repaired,
        total,
        result.rows_affected()
    );
    Ok(())
}
