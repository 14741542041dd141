//! Data models
//!
//! Shared between the server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! IDs are `i64` row ids (SQLite INTEGER PRIMARY KEY); timestamps are Unix millis.

pub mod attendance;
pub mod class;
pub mod gym;
pub mod member;
pub mod payment;
pub mod report;
pub mod token;
pub mod user;

// Re-exports
pub use attendance::*;
pub use class::*;
pub use gym::*;
pub use member::*;
pub use payment::*;
pub use report::*;
pub use token::*;
pub use user::*;
