//! Member API Handlers

use axum::extract::State;
use serde::Deserialize;
use shared::models::{Member, MemberSelfUpdate, MemberStatusUpdate};
use shared::{ApiResponse, AppError, AppResult, ErrorCode, Paginated};

use crate::api::{caller_member, check_member_access};
use crate::auth::Grant;
use crate::core::ServerState;
use crate::db::repository::{RepoError, member};
use crate::utils::types::parse_status;
use crate::utils::extract::{Json, Path, Query};
use crate::utils::{PaginationParams, ValidatedJson};

#[derive(Debug, Default, Deserialize)]
pub struct MemberQuery {
    /// Name, email or member code
    pub search: Option<String>,
    /// active | inactive | all
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<ServerState>,
    Query(filter): Query<MemberQuery>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<Member>> {
    let is_active = parse_status(filter.status.as_deref())?;
    let (members, total) = state
        .db
        .query(member::list(
            &state.db.pool,
            filter.search.as_deref(),
            is_active,
            page.page(),
            page.limit(),
        ))
        .await?;
    Ok(Paginated::new(members, total, page.page(), page.limit()))
}

/// Own member profile
pub async fn me(State(state): State<ServerState>, grant: Grant) -> AppResult<ApiResponse<Member>> {
    let member = caller_member(&state, &grant.user).await?;
    Ok(ApiResponse::success(member))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    grant: Grant,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Member>> {
    check_member_access(&state, &grant, id).await?;
    let member = state
        .db
        .query(member::find_by_id(&state.db.pool, id))
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;
    Ok(ApiResponse::success(member))
}

/// Emergency contact and notes of the caller's own profile
pub async fn update_me(
    State(state): State<ServerState>,
    grant: Grant,
    ValidatedJson(req): ValidatedJson<MemberSelfUpdate>,
) -> AppResult<ApiResponse<Member>> {
    let own = caller_member(&state, &grant.user).await?;
    let db = &state.db;
    let updated = db
        .bounded(async {
            let mut conn = db.writer.acquire().await.map_err(RepoError::from)?;
            Ok(member::update_self(&mut conn, own.id, &req).await?)
        })
        .await?;
    Ok(ApiResponse::success_with_message("Profile updated", updated))
}

/// Deactivate or reactivate a member; the ledger is untouched
pub async fn set_status(
    State(state): State<ServerState>,
    grant: Grant,
    Path(id): Path<i64>,
    Json(req): Json<MemberStatusUpdate>,
) -> AppResult<ApiResponse<Member>> {
    let db = &state.db;
    if !db.query(member::set_active(&db.writer, id, req.is_active)).await? {
        return Err(AppError::new(ErrorCode::MemberNotFound));
    }

    tracing::info!(
        member_id = id,
        is_active = req.is_active,
        by = grant.user.id,
        "Member status changed"
    );

    let member = db
        .query(member::find_by_id(&db.pool, id))
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;
    Ok(ApiResponse::success(member))
}
