//! Shared types for the gym server
//!
//! Error codes, response envelopes, domain models and request payloads used
//! by the server and its API clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode, Paginated};
pub use http;
pub use serde::{Deserialize, Serialize};
