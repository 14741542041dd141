use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::auth::{JwtService, RateLimiter};
use crate::core::tasks::BackgroundTasks;
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::ledger;
use crate::services::registration;

/// Server state, shared by every handler
///
/// Cloning is cheap: pools and services are reference counted.
///
/// | Field | Meaning |
/// |-------|---------|
/// | config | immutable configuration |
/// | db | SQLite read pool + single writer |
/// | jwt_service | token issue/validation |
/// | rate_limiter | login/register throttling |
/// | started_at | process start, reported by health |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub jwt_service: Arc<JwtService>,
    pub rate_limiter: RateLimiter,
    pub started_at: Instant,
}

impl ServerState {
    pub fn new(config: Config, db: DbService, jwt_service: Arc<JwtService>) -> Self {
        Self {
            config,
            db,
            jwt_service,
            rate_limiter: RateLimiter::new(),
            started_at: Instant::now(),
        }
    }

    /// Initialize server state
    ///
    /// 1. work directory
    /// 2. database + migrations
    /// 3. JWT service
    /// 4. bootstrap admin account, when configured
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir()?;

        let db_path = config.database_file();
        let db = DbService::with_timeout(&db_path.to_string_lossy(), config.db_timeout())
            .await
            .map_err(|e| ServerError::Database(e.message))?;

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let state = Self::new(config.clone(), db, jwt_service);

        if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
            registration::ensure_admin(&state, email, password).await?;
        }

        Ok(state)
    }

    /// Start periodic maintenance
    ///
    /// - ledger reconciliation (report only, never corrects)
    /// - rate limiter cleanup
    /// - daily pruning of old application logs
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        if self.config.reconcile_interval_secs > 0 {
            let state = self.clone();
            tasks.spawn_periodic(
                "ledger_reconcile",
                Duration::from_secs(self.config.reconcile_interval_secs),
                move || {
                    let state = state.clone();
                    async move { state.reconcile_ledger().await }
                },
            );
        }

        let limiter = self.rate_limiter.clone();
        tasks.spawn_periodic("rate_limit_cleanup", Duration::from_secs(300), move || {
            let limiter = limiter.clone();
            async move { limiter.cleanup() }
        });

        if let Some(dir) = self.config.log_dir.clone() {
            tasks.spawn_periodic("log_cleanup", Duration::from_secs(24 * 60 * 60), move || {
                let dir = dir.clone();
                async move {
                    if let Err(e) = crate::cleanup_old_logs(
                        std::path::Path::new(&dir),
                        crate::utils::logger::APP_LOG_RETENTION_DAYS,
                    ) {
                        tracing::warn!(error = %e, "Log cleanup failed");
                    }
                }
            });
        }

        tasks.log_summary();
        tasks
    }

    /// Compare cached balances with the ledger and log any drift
    pub async fn reconcile_ledger(&self) {
        match ledger::reconcile(&self.db).await {
            Ok(drift) if drift.is_empty() => {
                tracing::debug!("Ledger reconciliation: all balances consistent");
            }
            Ok(drift) => {
                for d in &drift {
                    tracing::warn!(
                        member_id = d.member_id,
                        member_code = %d.member_code,
                        cached = d.cached_balance,
                        ledger = d.ledger_balance,
                        "Balance drift detected"
                    );
                }
                tracing::warn!(count = drift.len(), "Ledger reconciliation found drift");
            }
            Err(e) => tracing::error!(error = %e, "Ledger reconciliation failed"),
        }
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
