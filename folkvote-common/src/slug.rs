//! URL slug generation
//!
//! Slugs are derived once, before first persistence, and never recomputed
//! on later edits. The slug column's UNIQUE constraint remains the
//! authority under concurrent creation; callers retry insertion on a
//! unique-constraint conflict.

use crate::Result;
use rand::Rng;
use sqlx::{Row, SqlitePool};

const FALLBACK_LEN: usize = 8;
const FALLBACK_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Normalize source fields into a URL-safe slug
///
/// Joins non-empty fields with spaces, lowercases, strips everything
/// outside `[a-z0-9 -]`, collapses whitespace and hyphen runs to single
/// hyphens and trims leading/trailing hyphens. Can return an empty string
/// (e.g. for an emoji-only title); see [`fallback_slug`].
pub fn slugify(fields: &[&str]) -> String {
    let joined = fields
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    joined
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect::<String>()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Random lowercase-alphanumeric slug for titles that normalize to nothing
pub fn fallback_slug() -> String {
    let mut rng = rand::thread_rng();
    (0..FALLBACK_LEN)
        .map(|_| FALLBACK_CHARS[rng.gen_range(0..FALLBACK_CHARS.len())] as char)
        .collect()
}

/// Derive a slug from `fields` that is unused in `table`
///
/// Appends `-1`, `-2`, ... to the base slug until an unused slug is found.
pub async fn unique_slug(pool: &SqlitePool, table: &str, fields: &[&str]) -> Result<String> {
    let mut base = slugify(fields);
    if base.is_empty() {
        base = fallback_slug();
    }

    let query = format!("SELECT COUNT(*) AS n FROM {table} WHERE slug = ?");
    let mut candidate = base.clone();
    let mut suffix = 0u32;

    loop {
        let row = sqlx::query(&query).bind(&candidate).fetch_one(pool).await?;
        let n: i64 = row.get("n");
        if n == 0 {
            return Ok(candidate);
        }
        suffix += 1;
        candidate = format!("{base}-{suffix}");
    }
}
