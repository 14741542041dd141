//! Payment API Module
//!
//! Recording a payment credits its tokens; a refund debits them back. Both go
//! through the ledger in the same unit of work as the payment row.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{Action, Resource, require_policy};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    let create_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_policy(Resource::Payments, Action::Create)));

    let refund_routes = Router::new()
        .route("/{id}/refund", post(handler::refund))
        .layer(middleware::from_fn(require_policy(Resource::Payments, Action::Refund)));

    let list_routes = Router::new()
        .route("/", get(handler::list))
        .route("/my", get(handler::my_payments))
        .layer(middleware::from_fn(require_policy(Resource::Payments, Action::List)));

    let read_routes = Router::new()
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_policy(Resource::Payments, Action::Read)));

    create_routes
        .merge(refund_routes)
        .merge(list_routes)
        .merge(read_routes)
}
