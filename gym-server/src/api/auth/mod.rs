//! Authentication Routes
//!
//! - `POST /api/auth/register`, `POST /api/auth/login`: public, rate limited per IP
//! - `GET /api/auth/me`, `PUT /api/auth/profile`: any authenticated user

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::{login_rate_limit, register_rate_limit};
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    let register = Router::new()
        .route("/api/auth/register", post(handler::register))
        .layer(middleware::from_fn_with_state(state.clone(), register_rate_limit));

    let login = Router::new()
        .route("/api/auth/login", post(handler::login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    // Authenticated by the global require_auth layer
    let account = Router::new()
        .route("/api/auth/me", get(handler::me))
        .route("/api/auth/profile", put(handler::update_profile));

    register.merge(login).merge(account)
}
