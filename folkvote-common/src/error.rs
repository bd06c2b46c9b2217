//! Common error types for FOLKVOTE

use thiserror::Error;

/// Common result type for FOLKVOTE operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the FOLKVOTE backend
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// State conflict: duplicate vote, second original cover, taken slug
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the wrapped database error is a UNIQUE constraint violation.
    ///
    /// The unique indexes on votes and covers are the last line of defense
    /// against races; callers translate this into a domain `Conflict` or a
    /// retry instead of leaking the raw storage error.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => {
                db_err.is_unique_violation()
            }
            _ => false,
        }
    }
}
