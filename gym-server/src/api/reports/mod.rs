//! Report export
//!
//! `GET /api/reports/export/{type}/{format}`
//!
//! - type: members, gyms, attendance, classes, transactions
//! - format: json (envelope) or csv (attachment, header-only when empty)
//! - filters: `search`, `status`, `startDate`, `endDate`

mod handler;
mod rows;

use axum::{Router, middleware, routing::get};

use crate::auth::{Action, Resource, require_policy};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/reports/export/{export_type}/{format}", get(handler::export))
        .layer(middleware::from_fn(require_policy(Resource::Reports, Action::Export)))
}
