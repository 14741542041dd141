//! Gym API Module
//!
//! Listing, search and detail are public (`require_auth` skips them); owner
//! and admin routes go through the policy table.

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{Action, Resource, require_policy};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/gyms", routes())
}

fn routes() -> Router<ServerState> {
    let public_routes = Router::new()
        .route("/", get(handler::list))
        .route("/search", get(handler::search))
        .route("/{id}", get(handler::get_by_id));

    let create_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_policy(Resource::Gyms, Action::Create)));

    let read_routes = Router::new()
        .route("/my", get(handler::my_gym))
        .route("/my/stats", get(handler::my_stats))
        .route("/my/members", get(handler::my_members))
        .route("/{id}/stats", get(handler::stats))
        .route("/{id}/members", get(handler::members))
        .layer(middleware::from_fn(require_policy(Resource::Gyms, Action::Read)));

    let update_routes = Router::new()
        .route("/my", put(handler::update_my_gym))
        .route("/{id}", put(handler::update))
        .layer(middleware::from_fn(require_policy(Resource::Gyms, Action::Update)));

    let delete_routes = Router::new()
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_policy(Resource::Gyms, Action::Delete)));

    public_routes
        .merge(create_routes)
        .merge(read_routes)
        .merge(update_routes)
        .merge(delete_routes)
}
