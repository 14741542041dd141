//! Class API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{Action, Resource, require_policy};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/classes", routes())
}

fn routes() -> Router<ServerState> {
    // Schedule is visible to every role
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/my", get(handler::my_classes))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_policy(Resource::Classes, Action::Read)));

    let create_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_policy(Resource::Classes, Action::Create)));

    let update_routes = Router::new()
        .route("/{id}", put(handler::update))
        .layer(middleware::from_fn(require_policy(Resource::Classes, Action::Update)));

    let delete_routes = Router::new()
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_policy(Resource::Classes, Action::Delete)));

    let enroll_routes = Router::new()
        .route("/{id}/enroll", post(handler::enroll))
        .layer(middleware::from_fn(require_policy(Resource::Classes, Action::Enroll)));

    let roster_routes = Router::new()
        .route("/{id}/attendees", get(handler::attendees))
        .route("/{id}/participants", get(handler::participants))
        .layer(middleware::from_fn(require_policy(Resource::Attendance, Action::List)));

    let withdraw_routes = Router::new()
        .route("/{id}/participants/{member_id}", delete(handler::withdraw))
        .layer(middleware::from_fn(require_policy(Resource::Classes, Action::Withdraw)));

    read_routes
        .merge(create_routes)
        .merge(update_routes)
        .merge(delete_routes)
        .merge(enroll_routes)
        .merge(roster_routes)
        .merge(withdraw_routes)
}
