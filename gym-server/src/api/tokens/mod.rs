//! Token ledger API
//!
//! Reads for every role (members see their own), adjustments and audit for
//! admins.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{Action, Resource, require_policy};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tokens", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/balance/{member_id}", get(handler::balance))
        .route("/transactions", get(handler::transactions))
        .layer(middleware::from_fn(require_policy(Resource::Tokens, Action::Read)));

    let adjust_routes = Router::new()
        .route("/{member_id}/credit", post(handler::credit))
        .route("/{member_id}/debit", post(handler::debit))
        .layer(middleware::from_fn(require_policy(Resource::Tokens, Action::Adjust)));

    let audit_routes = Router::new()
        .route("/stats", get(handler::stats))
        .route("/reconcile", get(handler::reconcile))
        .layer(middleware::from_fn(require_policy(Resource::Tokens, Action::Audit)));

    read_routes.merge(adjust_routes).merge(audit_routes)
}
