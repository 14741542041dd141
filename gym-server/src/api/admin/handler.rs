//! Admin API Handlers

use axum::extract::State;
use serde::Deserialize;
use shared::models::{DashboardStats, Role, User, UserAdminUpdate};
use shared::util::now_millis;
use shared::{ApiResponse, AppError, AppResult, ErrorCode, Paginated};

use crate::auth::Grant;
use crate::core::ServerState;
use crate::db::repository::{RepoError, report, token_transaction, user};
use crate::security_log;
use crate::utils::PaginationParams;
use crate::utils::extract::{Json, Path, Query};

/// Entries shown in the dashboard's recent activity
const RECENT_TRANSACTIONS: i64 = 10;
/// Window for the per-type token usage
const USAGE_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<Role>,
}

pub async fn list_users(
    State(state): State<ServerState>,
    Query(query): Query<UserQuery>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<User>> {
    let (users, total) = state
        .db
        .query(user::list(&state.db.pool, query.role, page.page(), page.limit()))
        .await?;
    Ok(Paginated::new(users, total, page.page(), page.limit()))
}

/// Change role or active flag of another account
pub async fn update_user(
    State(state): State<ServerState>,
    grant: Grant,
    Path(id): Path<i64>,
    Json(req): Json<UserAdminUpdate>,
) -> AppResult<ApiResponse<User>> {
    if id == grant.user.id {
        return Err(AppError::new(ErrorCode::CannotModifySelf));
    }

    let db = &state.db;
    let updated = db
        .bounded(async {
            let mut conn = db.writer.acquire().await.map_err(RepoError::from)?;
            Ok(user::admin_update(&mut conn, id, req.role, req.is_active).await?)
        })
        .await?;

    security_log!(
        "INFO",
        "user_updated",
        user_id = id,
        role = updated.role.as_str(),
        is_active = updated.is_active,
        by = grant.user.id
    );
    Ok(ApiResponse::success_with_message("User updated", updated))
}

pub async fn dashboard(State(state): State<ServerState>) -> AppResult<ApiResponse<DashboardStats>> {
    let db = &state.db;
    let counts = db.query(report::counts(&db.pool)).await?;
    let recent_transactions = db
        .query(token_transaction::recent(&db.pool, RECENT_TRANSACTIONS))
        .await?;
    let since = now_millis() - USAGE_WINDOW_DAYS * 24 * 60 * 60 * 1000;
    let token_usage = db
        .query(token_transaction::usage_by_type(&db.pool, since))
        .await?;

    Ok(ApiResponse::success(DashboardStats {
        total_members: counts.total_members,
        active_members: counts.active_members,
        total_gyms: counts.total_gyms,
        total_classes: counts.total_classes,
        recent_transactions,
        token_usage,
    }))
}
