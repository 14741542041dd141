//! Gym API Handlers

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use shared::models::{Gym, GymCreate, GymStats, GymUpdate, Member};
use shared::{ApiResponse, AppError, AppResult, ErrorCode, Paginated};

use crate::api::caller_gym;
use crate::auth::Grant;
use crate::core::ServerState;
use crate::db::repository::{RepoError, gym, member};
use crate::services::registration;
use crate::utils::extract::{Path, Query};
use crate::utils::{PaginationParams, ValidatedJson};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Matches gym name or city
    pub name: Option<String>,
}

async fn load_gym(state: &ServerState, id: i64) -> AppResult<Gym> {
    state
        .db
        .query(gym::find_by_id(&state.db.pool, id))
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::GymNotFound))
}

/// Active gyms, by name
pub async fn list(
    State(state): State<ServerState>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<Gym>> {
    let (gyms, total) = state
        .db
        .query(gym::list(&state.db.pool, None, true, page.page(), page.limit()))
        .await?;
    Ok(Paginated::new(gyms, total, page.page(), page.limit()))
}

pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<Gym>> {
    let (gyms, total) = state
        .db
        .query(gym::list(
            &state.db.pool,
            query.name.as_deref(),
            true,
            page.page(),
            page.limit(),
        ))
        .await?;
    Ok(Paginated::new(gyms, total, page.page(), page.limit()))
}

/// Public detail; deactivated gyms are hidden
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Gym>> {
    let found = load_gym(&state, id).await?;
    if !found.is_active {
        return Err(AppError::new(ErrorCode::GymNotFound));
    }
    Ok(ApiResponse::success(found))
}

/// Create a gym and its owner account
pub async fn create(
    State(state): State<ServerState>,
    grant: Grant,
    ValidatedJson(req): ValidatedJson<GymCreate>,
) -> AppResult<(StatusCode, ApiResponse<Gym>)> {
    let created = registration::create_gym(&state, &req).await?;
    tracing::info!(gym_id = created.id, by = grant.user.id, "Gym created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Gym created", created),
    ))
}

async fn apply_update(state: &ServerState, id: i64, req: &GymUpdate) -> AppResult<Gym> {
    let db = &state.db;
    db.bounded(async {
        let mut conn = db.writer.acquire().await.map_err(RepoError::from)?;
        gym::update(&mut conn, id, req).await.map_err(|e| match e {
            RepoError::NotFound(_) => AppError::new(ErrorCode::GymNotFound),
            other => other.into(),
        })
    })
    .await
}

/// Update a gym; only admins may change the active flag
pub async fn update(
    State(state): State<ServerState>,
    grant: Grant,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<GymUpdate>,
) -> AppResult<ApiResponse<Gym>> {
    let existing = load_gym(&state, id).await?;
    grant.check_owner(Some(existing.owner_id))?;
    if !grant.is_any() && req.is_active.is_some() {
        return Err(AppError::forbidden("Only administrators can change the gym status"));
    }
    let updated = apply_update(&state, id, &req).await?;
    Ok(ApiResponse::success_with_message("Gym updated", updated))
}

/// Soft delete
pub async fn delete(
    State(state): State<ServerState>,
    grant: Grant,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    if !state
        .db
        .query(gym::set_active(&state.db.writer, id, false))
        .await?
    {
        return Err(AppError::new(ErrorCode::GymNotFound));
    }
    tracing::info!(gym_id = id, by = grant.user.id, "Gym deactivated");
    Ok(ApiResponse::ok("Gym deactivated"))
}

pub async fn my_gym(State(state): State<ServerState>, grant: Grant) -> AppResult<ApiResponse<Gym>> {
    Ok(ApiResponse::success(caller_gym(&state, &grant.user).await?))
}

pub async fn update_my_gym(
    State(state): State<ServerState>,
    grant: Grant,
    ValidatedJson(req): ValidatedJson<GymUpdate>,
) -> AppResult<ApiResponse<Gym>> {
    if req.is_active.is_some() {
        return Err(AppError::forbidden("Only administrators can change the gym status"));
    }
    let own = caller_gym(&state, &grant.user).await?;
    let updated = apply_update(&state, own.id, &req).await?;
    Ok(ApiResponse::success_with_message("Gym updated", updated))
}

pub async fn stats(
    State(state): State<ServerState>,
    grant: Grant,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<GymStats>> {
    let found = load_gym(&state, id).await?;
    grant.check_owner(Some(found.owner_id))?;
    let stats = state.db.query(gym::stats(&state.db.pool, &found)).await?;
    Ok(ApiResponse::success(stats))
}

pub async fn my_stats(
    State(state): State<ServerState>,
    grant: Grant,
) -> AppResult<ApiResponse<GymStats>> {
    let own = caller_gym(&state, &grant.user).await?;
    let stats = state.db.query(gym::stats(&state.db.pool, &own)).await?;
    Ok(ApiResponse::success(stats))
}

/// Members who have attended the gym's classes
pub async fn members(
    State(state): State<ServerState>,
    grant: Grant,
    Path(id): Path<i64>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<Member>> {
    let found = load_gym(&state, id).await?;
    grant.check_owner(Some(found.owner_id))?;
    gym_members(&state, found.id, &page).await
}

pub async fn my_members(
    State(state): State<ServerState>,
    grant: Grant,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<Member>> {
    let own = caller_gym(&state, &grant.user).await?;
    gym_members(&state, own.id, &page).await
}

async fn gym_members(
    state: &ServerState,
    gym_id: i64,
    page: &PaginationParams,
) -> AppResult<Paginated<Member>> {
    let (members, total) = state
        .db
        .query(member::list_by_gym(&state.db.pool, gym_id, page.page(), page.limit()))
        .await?;
    Ok(Paginated::new(members, total, page.page(), page.limit()))
}
