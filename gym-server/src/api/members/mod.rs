//! Member API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::{Action, Resource, require_policy};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/members", routes())
}

fn routes() -> Router<ServerState> {
    let list_routes = Router::new()
        .route("/", get(handler::list))
        .layer(middleware::from_fn(require_policy(Resource::Members, Action::List)));

    let read_routes = Router::new()
        .route("/me", get(handler::me))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_policy(Resource::Members, Action::Read)));

    let update_routes = Router::new()
        .route("/me", put(handler::update_me))
        .layer(middleware::from_fn(require_policy(Resource::Members, Action::Update)));

    // Soft delete / reactivate (admin)
    let status_routes = Router::new()
        .route("/{id}/status", put(handler::set_status))
        .layer(middleware::from_fn(require_policy(Resource::Members, Action::Delete)));

    list_routes
        .merge(read_routes)
        .merge(update_routes)
        .merge(status_routes)
}
