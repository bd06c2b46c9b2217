//! Domain models
//!
//! UUIDs are stored as hyphenated TEXT and parsed on read; timestamps are
//! bound from `chrono::Utc::now()` at insert time so recency ordering has
//! sub-second precision.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(Error::Internal(format!("unknown role in database: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    /// Absent for externally-authenticated accounts
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing)]
    pub password_salt: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Song {
    pub id: Uuid,
    pub title: String,
    /// Original artist name
    pub artist: String,
    pub year: Option<i64>,
    pub slug: String,
    /// Running counter maintained by cover creation/deletion
    pub covers_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cover {
    pub id: Uuid,
    pub song_id: Uuid,
    pub submitter_id: Option<Uuid>,
    pub artist: String,
    pub year: Option<i64>,
    pub media_url: String,
    /// Sum of this cover's vote values
    pub votes_score: i64,
    /// Count of this cover's votes
    pub votes_count: i64,
    /// At most one original per song
    pub original: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Vote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cover_id: Uuid,
    pub value: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("invalid uuid in database: {e}")))
}

fn parse_optional_uuid(value: Option<String>) -> Result<Option<Uuid>> {
    value.as_deref().map(parse_uuid).transpose()
}

/// Map a `SELECT * FROM users` row
pub fn user_from_row(row: &SqliteRow) -> Result<User> {
    let id: String = row.get("id");
    let role: String = row.get("role");

    Ok(User {
        id: parse_uuid(&id)?,
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        password_salt: row.get("password_salt"),
        role: Role::parse(&role)?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Map a `SELECT * FROM songs` row
pub fn song_from_row(row: &SqliteRow) -> Result<Song> {
    let id: String = row.get("id");

    Ok(Song {
        id: parse_uuid(&id)?,
        title: row.get("title"),
        artist: row.get("artist"),
        year: row.get("year"),
        slug: row.get("slug"),
        covers_count: row.get("covers_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Map a `SELECT * FROM covers` row
pub fn cover_from_row(row: &SqliteRow) -> Result<Cover> {
    let id: String = row.get("id");
    let song_id: String = row.get("song_id");
    let submitter_id: Option<String> = row.get("submitter_id");

    Ok(Cover {
        id: parse_uuid(&id)?,
        song_id: parse_uuid(&song_id)?,
        submitter_id: parse_optional_uuid(submitter_id)?,
        artist: row.get("artist"),
        year: row.get("year"),
        media_url: row.get("media_url"),
        votes_score: row.get("votes_score"),
        votes_count: row.get("votes_count"),
        original: row.get("original"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Map a `SELECT * FROM votes` row
pub fn vote_from_row(row: &SqliteRow) -> Result<Vote> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let cover_id: String = row.get("cover_id");

    Ok(Vote {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        cover_id: parse_uuid(&cover_id)?,
        value: row.get("value"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::parse("user").unwrap(), Role::User);
        assert_eq!(Role::parse("admin").unwrap(), Role::Admin);
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Admin.as_str(), "admin");
        assert!(Role::parse("superuser").is_err());
    }

    #[test]
    fn test_user_serialization_hides_credentials() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.c".to_string(),
            username: "alice".to_string(),
            password_hash: Some("deadbeef".to_string()),
            password_salt: Some("salt".to_string()),
            role: Role::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password_salt").is_none());
        assert_eq!(json["role"], "user");
    }
}
