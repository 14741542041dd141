//! Authentication Handlers

use std::time::Duration;

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use shared::models::{
    LoginRequest, LoginResponse, ProfileSummary, ProfileUpdate, RegisterRequest, Role, User,
};
use shared::{ApiResponse, AppError, AppResult, ErrorCode};

use crate::auth::CurrentUser;
use crate::auth::password::{hash_password, verify_password};
use crate::core::ServerState;
use crate::db::repository::{RepoError, gym, member, user};
use crate::security_log;
use crate::services::registration;
use crate::utils::ValidatedJson;

/// Fixed delay before answering a login, so timing does not reveal whether
/// the email exists
const AUTH_FIXED_DELAY_MS: u64 = 250;

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileSummary>,
}

fn issue_token(state: &ServerState, user: &User) -> AppResult<String> {
    state
        .get_jwt_service()
        .generate_token(user.id, &user.name, user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))
}

/// Role-specific profile attached to login and `me`
async fn profile_summary(state: &ServerState, user: &User) -> AppResult<Option<ProfileSummary>> {
    let db = &state.db;
    let summary = match user.role {
        Role::Member => db
            .query(member::find_by_user_id(&db.pool, user.id))
            .await?
            .map(|m| ProfileSummary::Member {
                member_id: m.id,
                member_code: m.member_code,
                token_balance: m.token_balance,
            }),
        Role::Gym => db
            .query(gym::find_by_owner(&db.pool, user.id))
            .await?
            .map(|g| ProfileSummary::Gym {
                gym_id: g.id,
                gym_name: g.name,
            }),
        Role::Admin => None,
    };
    Ok(summary)
}

/// Register a member account
///
/// Creates the user, the member profile and the starting grant, then signs
/// the new user in.
pub async fn register(
    State(state): State<ServerState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, ApiResponse<LoginResponse>)> {
    let registered = registration::register_member(&state, &req).await?;
    let token = issue_token(&state, &registered.user)?;

    let member = registered.member;
    let response = LoginResponse {
        token,
        expires_in: state.get_jwt_service().expires_in(),
        user: registered.user,
        profile: Some(ProfileSummary::Member {
            member_id: member.id,
            member_code: member.member_code,
            token_balance: member.token_balance,
        }),
    };

    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Registration successful", response),
    ))
}

/// Login handler
///
/// Unknown email and wrong password share one message.
pub async fn login(
    State(state): State<ServerState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let db = &state.db;
    let found = db.query(user::find_by_email(&db.pool, &req.email)).await?;

    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    let account = match found {
        Some(account) => {
            if !verify_password(&req.password, &account.password_hash).await? {
                security_log!("WARN", "login_failed", email = req.email.as_str(), reason = "invalid_password");
                return Err(AppError::invalid_credentials());
            }
            if !account.is_active {
                security_log!("WARN", "login_disabled", user_id = account.id);
                return Err(AppError::new(ErrorCode::AccountDisabled));
            }
            account
        }
        None => {
            security_log!("WARN", "login_failed", email = req.email.as_str(), reason = "unknown_email");
            return Err(AppError::invalid_credentials());
        }
    };

    db.query(user::touch_login(&db.writer, account.id)).await?;

    let token = issue_token(&state, &account)?;
    let profile = profile_summary(&state, &account).await?;

    tracing::info!(user_id = account.id, role = %account.role, "User logged in");

    Ok(ApiResponse::success(LoginResponse {
        token,
        expires_in: state.get_jwt_service().expires_in(),
        user: account,
        profile,
    }))
}

/// Current account and its profile summary
pub async fn me(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<ApiResponse<AccountResponse>> {
    let db = &state.db;
    let account = db
        .query(user::find_by_id(&db.pool, current.id))
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {}", current.id)))?;
    let profile = profile_summary(&state, &account).await?;
    Ok(ApiResponse::success(AccountResponse {
        user: account,
        profile,
    }))
}

/// Update name, phone or password of the current account
pub async fn update_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
    ValidatedJson(req): ValidatedJson<ProfileUpdate>,
) -> AppResult<ApiResponse<User>> {
    let password_hash = match &req.password {
        Some(password) => Some(hash_password(password).await?),
        None => None,
    };

    let db = &state.db;
    let updated = db
        .bounded(async {
            let mut conn = db.writer.acquire().await.map_err(RepoError::from)?;
            Ok(user::update_profile(
                &mut conn,
                current.id,
                req.name.as_deref(),
                req.phone.as_deref(),
                password_hash.as_deref(),
            )
            .await?)
        })
        .await?;

    if password_hash.is_some() {
        security_log!("INFO", "password_changed", user_id = current.id);
    }
    Ok(ApiResponse::success_with_message("Profile updated", updated))
}
