//! Repository Module
//!
//! Free async functions over SQLite, one module per table. Reads take any
//! executor (pool or open transaction); multi-statement writes take
//! `&mut SqliteConnection` so they run inside the caller's transaction.

pub mod attendance;
pub mod class;
pub mod gym;
pub mod member;
pub mod payment;
pub mod report;
pub mod token_transaction;
pub mod user;

use shared::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage timeout: {0}")]
    Timeout(String),
}

/// SQLITE_BUSY, SQLITE_LOCKED and their extended codes
const BUSY_CODES: &[&str] = &["5", "6", "261", "262", "517"];

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".into()),
            sqlx::Error::PoolTimedOut => RepoError::Timeout("connection pool timed out".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.message().to_string())
            }
            sqlx::Error::Database(db) if db.is_check_violation() => {
                RepoError::Validation(db.message().to_string())
            }
            sqlx::Error::Database(db)
                if db.code().is_some_and(|c| BUSY_CODES.iter().any(|b| c == *b)) =>
            {
                RepoError::Timeout(db.message().to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Timeout(msg) => {
                tracing::warn!(error = %msg, "Storage busy");
                AppError::timeout("Storage is busy, please retry")
            }
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// `LIMIT ? OFFSET ?` values for a 1-based page
pub fn page_window(page: u32, limit: u32) -> (i64, i64) {
    let limit = limit.max(1) as i64;
    let offset = (page.max(1) as i64 - 1) * limit;
    (limit, offset)
}

/// `%term%` for LIKE, with the wildcard characters escaped (`ESCAPE '\'`)
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
