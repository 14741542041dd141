//! Database Module
//!
//! Handles the SQLite connection pools, migrations and the timeout bound on
//! units of work.

pub mod repository;

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use shared::{AppError, AppResult};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

/// Database service, owns the SQLite pools
///
/// - `pool`: readers, several connections (WAL allows concurrent reads)
/// - `writer`: exactly one connection; every mutating unit of work runs as a
///   transaction here, so balance checks and the writes that depend on them
///   never interleave
#[derive(Clone, Debug)]
pub struct DbService {
    pub pool: SqlitePool,
    pub writer: SqlitePool,
    timeout: Duration,
}

impl DbService {
    /// Open the database with the default 5s storage timeout
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        Self::with_timeout(db_path, Duration::from_millis(5000)).await
    }

    /// Open the database (WAL, foreign keys on) and apply migrations
    pub async fn with_timeout(db_path: &str, timeout: Duration) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(timeout)
            .optimize_on_close(true, None);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(timeout)
            .connect_with(options.clone())
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        sqlx::migrate!("./migrations")
            .run(&writer)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
        tracing::info!("Database migrations applied");

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .acquire_timeout(timeout)
            .connect_with(options.read_only(true))
            .await
            .map_err(|e| AppError::database(format!("Failed to open read pool: {e}")))?;

        tracing::info!(
            path = %db_path,
            timeout_ms = timeout.as_millis() as u64,
            "Database connection established (SQLite WAL, single writer)"
        );

        Ok(Self {
            pool,
            writer,
            timeout,
        })
    }

    /// Storage bound applied to each unit of work
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `fut` under the storage timeout
    ///
    /// On expiry the future is dropped, which rolls back any open
    /// transaction, and the caller gets `TimeoutError`.
    pub async fn bounded<T, F>(&self, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Storage operation timed out"
                );
                Err(AppError::timeout("Storage operation timed out, please retry"))
            }
        }
    }

    /// [`bounded`](Self::bounded) for a single repository call
    pub async fn query<T, F>(&self, fut: F) -> AppResult<T>
    where
        F: Future<Output = repository::RepoResult<T>>,
    {
        self.bounded(async { fut.await.map_err(AppError::from) }).await
    }

    /// Cheap reachability check
    pub async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
