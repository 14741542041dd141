//! Admin API Module
//!
//! Account management and the dashboard.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::{Action, Resource, require_policy};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", routes())
}

fn routes() -> Router<ServerState> {
    let user_routes = Router::new()
        .route("/users", get(handler::list_users))
        .layer(middleware::from_fn(require_policy(Resource::Users, Action::List)));

    let manage_routes = Router::new()
        .route("/users/{id}", put(handler::update_user))
        .layer(middleware::from_fn(require_policy(Resource::Users, Action::Update)));

    let dashboard_routes = Router::new()
        .route("/stats", get(handler::dashboard))
        .layer(middleware::from_fn(require_policy(Resource::Reports, Action::Read)));

    user_routes.merge(manage_routes).merge(dashboard_routes)
}
