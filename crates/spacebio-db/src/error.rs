//! Database error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Paper not found: {0}")]
    NotFound(String),

    #[error("Database connection lock poisoned")]
    Poisoned,

    #[error("Blocking task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for DbError {
    fn from(err: tokio::task::JoinError) -> Self {
        DbError::Task(err.to_string())
    }
}

impl From<DbError> for spacebio_common::error::ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(id) => Self::NotFound(format!("Paper not found: {id}")),
            other => Self::Internal(other.to_string()),
        }
    }
}
