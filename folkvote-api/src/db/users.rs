//! User database operations

use chrono::Utc;
use folkvote_common::db::models::{user_from_row, Role, User};
use folkvote_common::{Error, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;
const SALT_LEN: usize = 16;

/// New user input
///
/// `password` is absent for externally-authenticated accounts.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: Option<String>,
    pub role: Role,
}

/// Create a new user
///
/// Usernames must be 3-30 characters; email and username are unique.
pub async fn create_user(pool: &SqlitePool, new: NewUser) -> Result<User> {
    let username_len = new.username.chars().count();
    if username_len < USERNAME_MIN || username_len > USERNAME_MAX {
        return Err(Error::InvalidInput(format!(
            "username must be {USERNAME_MIN}-{USERNAME_MAX} characters"
        )));
    }
    if new.email.trim().is_empty() || !new.email.contains('@') {
        return Err(Error::InvalidInput("a valid email is required".to_string()));
    }

    let (password_hash, password_salt) = match new.password.as_deref() {
        Some(password) => {
            let salt = generate_salt();
            (Some(digest_password(password, &salt)), Some(salt))
        }
        None => (None, None),
    };

    let user = User {
        id: Uuid::new_v4(),
        email: new.email,
        username: new.username,
        password_hash,
        password_salt,
        role: new.role,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO users (id, email, username, password_hash, password_salt, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(&user.password_salt)
    .bind(user.role.as_str())
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await;

    if let Err(e) = result {
        let err = Error::from(e);
        if err.is_unique_violation() {
            return Err(Error::Conflict(
                "email or username already taken".to_string(),
            ));
        }
        return Err(err);
    }

    info!("Created user {} ({})", user.username, user.id);
    Ok(user)
}

/// Load user by id
pub async fn get_user(pool: &SqlitePool, user_id: Uuid) -> Result<User> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => user_from_row(&row),
        None => Err(Error::NotFound(format!("user {user_id}"))),
    }
}

/// Check a password attempt against the stored digest
///
/// Always false for accounts without a local credential.
pub fn verify_password(user: &User, password: &str) -> bool {
    match (&user.password_hash, &user.password_salt) {
        (Some(hash), Some(salt)) => digest_password(password, salt) == *hash,
        _ => false,
    }
}

fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect()
}

fn digest_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_util::setup_pool;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: username.to_string(),
            password: Some("hunter2".to_string()),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let pool = setup_pool().await;
        let user = create_user(&pool, new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        let loaded = get_user(&pool, user.id).await.unwrap();
        assert_eq!(loaded.username, "alice");
        assert_eq!(loaded.email, "alice@example.com");
        assert_eq!(loaded.role, Role::User);
        assert!(loaded.password_hash.is_some());
    }

    #[tokio::test]
    async fn test_username_length_validated() {
        let pool = setup_pool().await;

        let err = create_user(&pool, new_user("ab", "ab@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let long = "x".repeat(31);
        let err = create_user(&pool, new_user(&long, "long@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_email_validated() {
        let pool = setup_pool().await;
        let err = create_user(&pool, new_user("alice", "not-an-email"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let pool = setup_pool().await;
        create_user(&pool, new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = create_user(&pool, new_user("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_external_account_has_no_credential() {
        let pool = setup_pool().await;
        let user = create_user(
            &pool,
            NewUser {
                email: "sso@example.com".to_string(),
                username: "sso-user".to_string(),
                password: None,
                role: Role::User,
            },
        )
        .await
        .unwrap();

        assert!(user.password_hash.is_none());
        assert!(!verify_password(&user, "anything"));
    }

    #[tokio::test]
    async fn test_verify_password() {
        let pool = setup_pool().await;
        let user = create_user(&pool, new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        assert!(verify_password(&user, "hunter2"));
        assert!(!verify_password(&user, "hunter3"));
    }

    #[tokio::test]
    async fn test_missing_user_not_found() {
        let pool = setup_pool().await;
        let err = get_user(&pool, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
