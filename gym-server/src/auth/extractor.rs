//! Request extractors
//!
//! [`CurrentUser`] and [`Grant`] as handler arguments.

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::AppError;

use crate::auth::middleware::load_account;
use crate::auth::{CurrentUser, Grant, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// Validates the bearer token unless `require_auth` already did
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => {
                security_log!("WARN", "auth_missing", uri = parts.uri.to_string());
                return Err(AppError::unauthorized());
            }
        };

        match state.get_jwt_service().validate_token(token) {
            Ok(claims) => {
                let claimed = CurrentUser::try_from(claims)
                    .map_err(|e| AppError::invalid_token(format!("Malformed token claims: {e}")))?;
                let user = load_account(state, claimed).await?;
                parts.extensions.insert(user.clone());
                Ok(user)
            }
            Err(e) => {
                security_log!(
                    "WARN",
                    "auth_failed",
                    error = e.to_string(),
                    uri = parts.uri.to_string()
                );
                match e {
                    JwtError::ExpiredToken => Err(AppError::token_expired()),
                    _ => Err(AppError::invalid_token("Invalid token")),
                }
            }
        }
    }
}

/// Grant stored by `require_policy`; a route without the layer is a bug,
/// reported as 403 rather than served unchecked
impl<S: Send + Sync> FromRequestParts<S> for Grant {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Grant>().cloned().ok_or_else(|| {
            tracing::error!(uri = %parts.uri, "Route is missing its policy layer");
            AppError::forbidden("Permission denied")
        })
    }
}
