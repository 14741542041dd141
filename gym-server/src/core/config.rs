use std::path::PathBuf;
use std::time::Duration;

use crate::auth::JwtConfig;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | database and log directory |
/// | DATABASE_PATH | WORK_DIR/gym.db | SQLite file |
/// | HTTP_PORT | 5000 | HTTP port |
/// | ENVIRONMENT | development | development / staging / production |
/// | REQUEST_TIMEOUT_MS | 30000 | per-request timeout |
/// | DB_TIMEOUT_MS | 5000 | bound on a single storage unit of work |
/// | STARTING_TOKEN_GRANT | 10 | tokens credited at registration |
/// | GYM_CHECKIN_COST | 1 | cost of a check-in without a class |
/// | ADMIN_EMAIL / ADMIN_PASSWORD | unset | bootstrap admin |
/// | RECONCILE_INTERVAL_SECS | 3600 | ledger reconciliation period, 0 disables |
/// | AUTH_RATE_LIMIT | 5 | login/register attempts per window per IP |
/// | AUTH_RATE_WINDOW_SECS | 60 | rate limit window |
/// | LOG_DIR | unset | rolling log file directory |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/srv/gym HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub database_path: Option<String>,
    pub http_port: u16,
    pub jwt: JwtConfig,
    /// development | staging | production
    pub environment: String,
    pub request_timeout_ms: u64,
    pub db_timeout_ms: u64,
    pub starting_token_grant: i64,
    pub gym_checkin_cost: i64,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub reconcile_interval_secs: u64,
    pub auth_rate_limit: u32,
    pub auth_rate_window_secs: u64,
    pub log_dir: Option<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            database_path: env_opt("DATABASE_PATH"),
            http_port: env_or("HTTP_PORT", 5000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30_000),
            db_timeout_ms: env_or("DB_TIMEOUT_MS", 5_000),
            starting_token_grant: env_or("STARTING_TOKEN_GRANT", 10),
            gym_checkin_cost: env_or("GYM_CHECKIN_COST", 1),
            admin_email: env_opt("ADMIN_EMAIL"),
            admin_password: env_opt("ADMIN_PASSWORD"),
            reconcile_interval_secs: env_or("RECONCILE_INTERVAL_SECS", 3_600),
            auth_rate_limit: env_or("AUTH_RATE_LIMIT", 5),
            auth_rate_window_secs: env_or("AUTH_RATE_WINDOW_SECS", 60),
            log_dir: env_opt("LOG_DIR"),
        }
    }

    /// Override the work directory and port
    ///
    /// Used by tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.database_path = None;
        config.http_port = http_port;
        config
    }

    /// SQLite file path
    pub fn database_file(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.work_dir).join("gym.db"),
        }
    }

    pub fn db_timeout(&self) -> Duration {
        Duration::from_millis(self.db_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Create the work directory if missing
    pub fn ensure_work_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        if let Some(parent) = self.database_file().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_file_defaults_to_work_dir() {
        let config = Config::with_overrides("/tmp/gym-test", 0);
        assert_eq!(config.database_file(), PathBuf::from("/tmp/gym-test/gym.db"));
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let mut config = Config::with_overrides("/tmp/gym-test", 0);
        config.database_path = Some("/var/db/members.db".into());
        assert_eq!(config.database_file(), PathBuf::from("/var/db/members.db"));
    }
}
