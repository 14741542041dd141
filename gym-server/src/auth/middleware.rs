//! Authentication middleware
//!
//! Axum middleware for JWT authentication and policy checks

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::Method;
use shared::{AppError, ErrorCode};

use crate::auth::policy::{Action, Resource, authorize};
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::db::repository::user;
use crate::security_log;

/// Routes reachable without a token
///
/// Gym browsing is public so prospective members can look around.
fn is_public_route(method: &Method, path: &str) -> bool {
    if *method == Method::POST {
        return matches!(path, "/api/auth/login" | "/api/auth/register");
    }
    if *method != Method::GET {
        return false;
    }
    match path {
        "/api/health" | "/api/gyms" | "/api/gyms/search" => true,
        _ => path
            .strip_prefix("/api/gyms/")
            .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())),
    }
}

/// Authentication middleware
///
/// Validates `Authorization: Bearer <token>` and inserts [`CurrentUser`] into
/// the request extensions.
///
/// # Skipped
///
/// - `OPTIONS *` (CORS preflight)
/// - non `/api/` paths (fall through to 404)
/// - login, register, health and the public gym listing
///
/// # Errors
///
/// | Error | HTTP |
/// |-------|------|
/// | no Authorization header | 401 NotAuthenticated |
/// | expired token | 401 TokenExpired |
/// | invalid token | 401 TokenInvalid |
/// | account deleted | 401 TokenInvalid |
/// | account deactivated | 403 AccountDisabled |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let path = req.uri().path();
    if !path.starts_with("/api/") || is_public_route(req.method(), path) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = req.uri().to_string());
            return Err(AppError::unauthorized());
        }
    };

    let claims = match state.get_jwt_service().validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                uri = req.uri().to_string()
            );
            return Err(match e {
                JwtError::ExpiredToken => AppError::token_expired(),
                _ => AppError::invalid_token("Invalid token"),
            });
        }
    };

    let claimed = CurrentUser::try_from(claims)
        .map_err(|e| AppError::invalid_token(format!("Malformed token claims: {e}")))?;
    let user = load_account(&state, claimed).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Re-read the account behind a valid token
///
/// Role and name come from the stored row, so a demotion or deactivation
/// takes effect before the token expires.
pub(crate) async fn load_account(
    state: &ServerState,
    claimed: CurrentUser,
) -> Result<CurrentUser, AppError> {
    let account = state
        .db
        .query(user::find_by_id(&state.db.pool, claimed.id))
        .await?
        .ok_or_else(|| {
            security_log!("WARN", "auth_unknown_account", user_id = claimed.id);
            AppError::invalid_token("Account no longer exists")
        })?;

    if !account.is_active {
        security_log!("WARN", "auth_account_disabled", user_id = account.id);
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    Ok(CurrentUser {
        id: account.id,
        name: account.name,
        role: account.role,
    })
}

/// Policy middleware
///
/// Consults the policy table once for the route and stores the resulting
/// [`Grant`](crate::auth::Grant) in the request extensions. Handlers take the
/// grant as an extractor and apply ownership checks themselves.
///
/// ```ignore
/// Router::new()
///     .route("/api/payments/{id}/refund", post(handler::refund))
///     .layer(middleware::from_fn(require_policy(Resource::Payments, Action::Refund)));
/// ```
pub fn require_policy(
    resource: Resource,
    action: Action,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |mut req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::unauthorized)?;
            let grant = authorize(user, resource, action)?;
            req.extensions_mut().insert(grant);
            Ok(next.run(req).await)
        })
    }
}

/// Access the authenticated user from a raw request
pub trait CurrentUserExt {
    /// 401 when the request was not authenticated
    fn current_user(&self) -> Result<&CurrentUser, AppError>;
}

impl CurrentUserExt for Request {
    fn current_user(&self) -> Result<&CurrentUser, AppError> {
        self.extensions()
            .get::<CurrentUser>()
            .ok_or_else(AppError::unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEnv;
    use shared::models::Role;

    #[test]
    fn test_public_routes() {
        assert!(is_public_route(&Method::POST, "/api/auth/login"));
        assert!(is_public_route(&Method::POST, "/api/auth/register"));
        assert!(is_public_route(&Method::GET, "/api/health"));
        assert!(is_public_route(&Method::GET, "/api/gyms"));
        assert!(is_public_route(&Method::GET, "/api/gyms/search"));
        assert!(is_public_route(&Method::GET, "/api/gyms/12"));
    }

    #[test]
    fn test_protected_routes() {
        assert!(!is_public_route(&Method::GET, "/api/auth/me"));
        assert!(!is_public_route(&Method::GET, "/api/gyms/my"));
        assert!(!is_public_route(&Method::GET, "/api/gyms/12/stats"));
        assert!(!is_public_route(&Method::PUT, "/api/gyms/12"));
        assert!(!is_public_route(&Method::GET, "/api/auth/login"));
        assert!(!is_public_route(&Method::GET, "/api/gyms/"));
    }

    #[tokio::test]
    async fn test_load_account_uses_stored_row() {
        let env = TestEnv::new().await;
        let member = env.member("ada@example.com").await;
        let claimed = CurrentUser {
            id: member.user_id,
            name: "stale".into(),
            role: Role::Admin,
        };

        let user = load_account(&env.state, claimed.clone()).await.unwrap();
        assert_eq!(user.role, Role::Member);
        assert_eq!(user.name, "ada");

        user::set_active(&env.state.db.writer, member.user_id, false).await.unwrap();
        let err = load_account(&env.state, claimed).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AccountDisabled);

        let ghost = CurrentUser {
            id: 9_999,
            name: "ghost".into(),
            role: Role::Member,
        };
        let err = load_account(&env.state, ghost).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }
}
