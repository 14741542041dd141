//! Logging Infrastructure
//!
//! Console output plus, when a log directory is configured:
//! - daily rotating application logs (`app/`, pruned by [`cleanup_old_logs`])
//! - daily rotating security logs (`security/`, target `security`, kept)

use std::fs;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "gym_server=info,tower_http=info";

/// Application log retention
pub const APP_LOG_RETENTION_DAYS: i64 = 14;

/// Initialize console-only logging
pub fn init_logger() -> anyhow::Result<()> {
    init_logger_with_file(DEFAULT_FILTER, false, None)
}

/// Initialize logging
///
/// * `level` - filter used when `RUST_LOG` is unset
/// * `json_format` - JSON lines (production) instead of pretty output
/// * `log_dir` - optional directory for rotating log files
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let (app_layer, security_layer) = match log_dir {
        Some(dir) => {
            let log_dir = Path::new(dir);
            let app_dir = log_dir.join("app");
            let security_dir = log_dir.join("security");
            fs::create_dir_all(&app_dir)?;
            fs::create_dir_all(&security_dir)?;

            let app_log = RollingFileAppender::new(Rotation::DAILY, app_dir, "app");
            let app_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::sync::Mutex::new(app_log))
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() != "security"
                }));

            let security_log = RollingFileAppender::new(Rotation::DAILY, security_dir, "security");
            let security_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::sync::Mutex::new(security_log))
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() == "security"
                }));

            (Some(app_layer), Some(security_layer))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(app_layer)
        .with(security_layer)
        .try_init()?;
    Ok(())
}

/// Delete `app.YYYY-MM-DD` files older than `days`
///
/// Security logs are never pruned.
pub fn cleanup_old_logs(log_dir: &Path, days: i64) -> anyhow::Result<usize> {
    let app_dir = log_dir.join("app");
    if !app_dir.exists() {
        return Ok(0);
    }

    let cutoff = chrono::Utc::now().date_naive() - chrono::Duration::days(days);
    let mut removed = 0;
    for entry in fs::read_dir(app_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(date) = name.strip_prefix("app.")
            && let Ok(date) = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
            && date < cutoff
        {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_keeps_recent_and_security_logs() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = dir.path().join("app");
        let security = dir.path().join("security");
        fs::create_dir_all(&app).unwrap();
        fs::create_dir_all(&security).unwrap();

        let today = chrono::Utc::now().date_naive();
        let old = today - chrono::Duration::days(30);
        fs::write(app.join(format!("app.{}", today.format("%Y-%m-%d"))), "").unwrap();
        fs::write(app.join(format!("app.{}", old.format("%Y-%m-%d"))), "").unwrap();
        fs::write(security.join(format!("security.{}", old.format("%Y-%m-%d"))), "").unwrap();

        let removed = cleanup_old_logs(dir.path(), APP_LOG_RETENTION_DAYS).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(fs::read_dir(&app).unwrap().count(), 1);
        assert_eq!(fs::read_dir(&security).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_dir_is_noop() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(cleanup_old_logs(&dir.path().join("nope"), 14).unwrap(), 0);
    }
}
