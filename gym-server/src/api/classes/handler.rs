//! Class API Handlers

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use shared::models::{Attendance, CheckInResult, Class, ClassCreate, ClassParticipant, ClassUpdate, Weekday};
use shared::{ApiResponse, AppError, AppResult, ErrorCode, Paginated};

use crate::api::{caller_gym, caller_member, check_member_access};
use crate::auth::Grant;
use crate::core::ServerState;
use crate::db::repository::attendance::{self, AttendanceFilter};
use crate::db::repository::class::{self, ClassFilter};
use crate::db::repository::{RepoError, gym};
use crate::services::attendance::{self as service, CheckIn};
use crate::utils::extract::{Path, Query};
use crate::utils::{PaginationParams, ValidatedJson};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassQuery {
    pub day: Option<Weekday>,
    pub active: Option<bool>,
    pub gym_id: Option<i64>,
}

/// Enrollment body; members may omit it
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub member_id: Option<i64>,
}

async fn load_class(state: &ServerState, id: i64) -> AppResult<Class> {
    state
        .db
        .query(class::find_by_id(&state.db.pool, id))
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ClassNotFound))
}

/// Gym owners may only touch classes of their own gym
async fn check_class_owner(state: &ServerState, grant: &Grant, class_id: i64) -> AppResult<()> {
    if grant.is_any() {
        return Ok(());
    }
    let owner = state
        .db
        .query(class::gym_owner_of(&state.db.pool, class_id))
        .await?;
    grant.check_owner(owner)
}

/// Weekly schedule, Monday first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ClassQuery>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<Class>> {
    let filter = ClassFilter {
        day: query.day,
        is_active: query.active,
        gym_id: query.gym_id,
    };
    let (classes, total) = state
        .db
        .query(class::list(&state.db.pool, filter, page.page(), page.limit()))
        .await?;
    Ok(Paginated::new(classes, total, page.page(), page.limit()))
}

/// Classes the calling member is enrolled in
pub async fn my_classes(
    State(state): State<ServerState>,
    grant: Grant,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<Class>> {
    let member = caller_member(&state, &grant.user).await?;
    let (classes, total) = state
        .db
        .query(class::list_for_member(&state.db.pool, member.id, page.page(), page.limit()))
        .await?;
    Ok(Paginated::new(classes, total, page.page(), page.limit()))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Class>> {
    Ok(ApiResponse::success(load_class(&state, id).await?))
}

/// Create a class
///
/// Gym owners always create for their own gym; admins may name any gym.
pub async fn create(
    State(state): State<ServerState>,
    grant: Grant,
    ValidatedJson(req): ValidatedJson<ClassCreate>,
) -> AppResult<(StatusCode, ApiResponse<Class>)> {
    let gym_id = if grant.is_any() {
        if let Some(gym_id) = req.gym_id
            && state
                .db
                .query(gym::find_by_id(&state.db.pool, gym_id))
                .await?
                .is_none()
        {
            return Err(AppError::new(ErrorCode::GymNotFound));
        }
        req.gym_id
    } else {
        Some(caller_gym(&state, &grant.user).await?.id)
    };

    let db = &state.db;
    let created = db
        .bounded(async {
            let mut conn = db.writer.acquire().await.map_err(RepoError::from)?;
            Ok(class::create(&mut conn, &req, gym_id).await?)
        })
        .await?;

    tracing::info!(class_id = created.id, gym_id = ?gym_id, by = grant.user.id, "Class created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Class created", created),
    ))
}

/// Update a class; capacity may not drop below the current enrollment
pub async fn update(
    State(state): State<ServerState>,
    grant: Grant,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<ClassUpdate>,
) -> AppResult<ApiResponse<Class>> {
    check_class_owner(&state, &grant, id).await?;

    let db = &state.db;
    let updated = db
        .bounded(async {
            let mut tx = db.writer.begin().await.map_err(RepoError::from)?;
            let existing = class::find_by_id(&mut *tx, id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::ClassNotFound))?;

            if let Some(capacity) = req.max_capacity
                && capacity < existing.current_enrollment
            {
                return Err(AppError::validation(format!(
                    "maxCapacity cannot be below the current enrollment ({})",
                    existing.current_enrollment
                ))
                .with_detail("currentEnrollment", existing.current_enrollment));
            }

            let updated = class::update(&mut tx, id, &req).await?;
            tx.commit().await.map_err(RepoError::from)?;
            Ok(updated)
        })
        .await?;

    Ok(ApiResponse::success_with_message("Class updated", updated))
}

/// Soft delete; refused while anyone is enrolled
pub async fn delete(
    State(state): State<ServerState>,
    grant: Grant,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    load_class(&state, id).await?;
    if !state
        .db
        .query(class::deactivate_if_empty(&state.db.writer, id))
        .await?
    {
        return Err(AppError::new(ErrorCode::ClassHasEnrollments));
    }
    tracing::info!(class_id = id, by = grant.user.id, "Class deactivated");
    Ok(ApiResponse::ok("Class deactivated"))
}

/// Enroll a member: takes a seat, opens an attendance and debits the cost
pub async fn enroll(
    State(state): State<ServerState>,
    grant: Grant,
    Path(id): Path<i64>,
    body: Bytes,
) -> AppResult<(StatusCode, ApiResponse<CheckInResult>)> {
    let req: EnrollRequest = if body.iter().all(u8::is_ascii_whitespace) {
        EnrollRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::with_message(ErrorCode::InvalidRequest, e.to_string()))?
    };

    let member_id = match req.member_id {
        Some(member_id) => {
            check_member_access(&state, &grant, member_id).await?;
            member_id
        }
        None if grant.is_any() => return Err(AppError::validation("memberId is required")),
        None => caller_member(&state, &grant.user).await?.id,
    };

    let result = service::check_in(
        &state,
        CheckIn {
            member_id,
            class_id: Some(id),
            actor: Some(grant.user.id),
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Enrolled", result),
    ))
}

/// Attendance records of the class, newest first
pub async fn attendees(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<Attendance>> {
    load_class(&state, id).await?;
    let filter = AttendanceFilter {
        class_id: Some(id),
        ..Default::default()
    };
    let (records, total) = state
        .db
        .query(attendance::list(&state.db.pool, filter, page.page(), page.limit()))
        .await?;
    Ok(Paginated::new(records, total, page.page(), page.limit()))
}

/// Members currently holding a seat
pub async fn participants(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Vec<ClassParticipant>>> {
    load_class(&state, id).await?;
    let list = state
        .db
        .query(class::participants(&state.db.pool, id))
        .await?;
    Ok(ApiResponse::success(list))
}

/// Free a member's seat; no token effect
pub async fn withdraw(
    State(state): State<ServerState>,
    grant: Grant,
    Path((id, member_id)): Path<(i64, i64)>,
) -> AppResult<ApiResponse<()>> {
    check_class_owner(&state, &grant, id).await?;
    service::withdraw(&state, id, member_id).await?;
    Ok(ApiResponse::ok("Participant withdrawn"))
}
