use thiserror::Error;

use shared::AppError;

/// Startup and lifecycle errors
///
/// Request-time failures use [`AppError`]; this type covers what can go wrong
/// before the listener is up or while it shuts down.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database initialization failed: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AppError> for ServerError {
    fn from(err: AppError) -> Self {
        ServerError::Internal(anyhow::Error::new(err))
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
