//! Gym Server - token-based gym membership backend
//!
//! # Architecture
//!
//! - **Ledger** (`ledger`): append-only token transactions, source of truth for balances
//! - **Database** (`db`): SQLite read pool plus a single writer connection
//! - **Auth** (`auth`): JWT + Argon2, role policy table
//! - **Services** (`services`): check-in, payments, registration
//! - **HTTP API** (`api`): REST routes and handlers
//!
//! # Layout
//!
//! ```text
//! gym-server/src/
//! ├── core/          # config, state, server, background tasks
//! ├── auth/          # JWT, policy, rate limiting
//! ├── ledger/        # token ledger
//! ├── services/      # multi-step operations
//! ├── api/           # HTTP routes and handlers
//! ├── utils/         # logging, validation, CSV
//! └── db/            # storage layer
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod ledger;
pub mod services;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export public types
pub use api::build_app;
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

// Security logging macro, structured fields on the `security` target
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env` and initialize logging
///
/// JSON output in production; rotating files when `LOG_DIR` is set.
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let production = std::env::var("ENVIRONMENT").is_ok_and(|env| env == "production");
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty());
    init_logger_with_file(utils::logger::DEFAULT_FILTER, production, log_dir.as_deref())
}

pub fn print_banner() {
    println!(
        r#"
   ______
  / ____/_  ______ ___
 / / __/ / / / __ `__ \
/ /_/ / /_/ / / / / / /
\____/\__, /_/ /_/ /_/
     /____/   server
    "#
    );
}
