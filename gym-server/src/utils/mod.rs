//! Utilities
//!
//! - [`logger`]: tracing setup
//! - [`extract`]: `Json`/`Query`/`Path` with enveloped rejections
//! - [`validation`]: request body validation
//! - [`types`]: query parameter types
//! - [`time`]: date parameters to millisecond bounds
//! - [`csv`]: CSV encoding for exports

pub mod csv;
pub mod extract;
pub mod logger;
pub mod time;
pub mod types;
pub mod validation;

pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode, Paginated};
pub use types::{DateRangeParams, PaginationParams};
pub use validation::{ValidatedJson, validate_request};
