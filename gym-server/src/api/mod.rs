//! HTTP API
//!
//! | Prefix | Module | Access |
//! |--------|--------|--------|
//! | /api/health | [`health`] | public |
//! | /api/auth | [`auth`] | register/login public |
//! | /api/members | [`members`] | policy |
//! | /api/tokens | [`tokens`] | policy |
//! | /api/attendance | [`attendance`] | policy |
//! | /api/classes | [`classes`] | policy |
//! | /api/payments | [`payments`] | policy |
//! | /api/gyms | [`gyms`] | listing public, rest policy |
//! | /api/admin | [`admin`] | admin |
//! | /api/reports | [`reports`] | admin |
//!
//! Every group wraps its routes in `require_policy(resource, action)`;
//! handlers take the resulting [`Grant`] and resolve ownership themselves.

pub mod admin;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod gyms;
pub mod health;
pub mod members;
pub mod payments;
pub mod reports;
pub mod tokens;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use http::{HeaderName, HeaderValue};
use shared::models::{Gym, Member};
use shared::{AppError, AppResult, ErrorCode};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::{CurrentUser, Grant};
use crate::core::ServerState;
use crate::db::repository::{gym, member};

/// Every API route, without global middleware
pub fn build_router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state))
        .merge(members::router())
        .merge(tokens::router())
        .merge(attendance::router())
        .merge(classes::router())
        .merge(payments::router())
        .merge(gyms::router())
        .merge(admin::router())
        .merge(reports::router())
}

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Application with global middleware and state
///
/// Used by the HTTP server and by in-process tests.
pub fn build_app(state: &ServerState) -> Router {
    build_router(state)
        // Authentication runs before routing, injects CurrentUser
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(state.config.request_timeout())),
        )
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state.clone())
}

/// Middleware errors as envelopes; the only source is the request timeout
async fn handle_timeout(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("Request timed out");
        AppError::timeout("Request timed out")
    } else {
        AppError::internal(format!("Unhandled middleware error: {err}"))
    }
}

/// Member profile of the caller
pub(crate) async fn caller_member(state: &ServerState, user: &CurrentUser) -> AppResult<Member> {
    state
        .db
        .query(member::find_by_user_id(&state.db.pool, user.id))
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::MemberNotFound, "No member profile for this account")
        })
}

/// Gym owned by the caller
pub(crate) async fn caller_gym(state: &ServerState, user: &CurrentUser) -> AppResult<Gym> {
    state
        .db
        .query(gym::find_by_owner(&state.db.pool, user.id))
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::GymNotFound, "No gym for this account"))
}

/// Ownership check for member-scoped records
///
/// `Scope::Any` grants pass without a lookup; `Scope::Own` grants pass only
/// when the member belongs to the caller.
pub(crate) async fn check_member_access(
    state: &ServerState,
    grant: &Grant,
    member_id: i64,
) -> AppResult<()> {
    if grant.is_any() {
        return Ok(());
    }
    let owner = state
        .db
        .query(member::owner_of(&state.db.pool, member_id))
        .await?;
    grant.check_owner(owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_slow_request_gets_timeout_envelope() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_timeout))
                    .layer(TimeoutLayer::new(Duration::from_millis(20))),
            );

        let response = app
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], ErrorCode::TimeoutError.code());
    }

    #[tokio::test]
    async fn test_other_middleware_errors_are_internal() {
        let err = handle_timeout("boom".into()).await;
        assert_eq!(err.code, ErrorCode::InternalError);
    }
}
