//! Attendance API Handlers

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use shared::models::{Attendance, AttendanceStats, CheckInRequest, CheckInResult, CheckOutResult};
use shared::{ApiResponse, AppError, AppResult, ErrorCode, Paginated};

use crate::api::check_member_access;
use crate::auth::Grant;
use crate::core::ServerState;
use crate::db::repository::attendance::{self, AttendanceFilter};
use crate::db::repository::class;
use crate::services::attendance::{self as service, CheckIn};
use crate::utils::time::date_bounds;
use crate::utils::extract::{Json, Path, Query};
use crate::utils::{DateRangeParams, PaginationParams};

#[derive(Debug, Default, Deserialize)]
pub struct ClassDayQuery {
    /// `YYYY-MM-DD`; all days when absent
    pub date: Option<String>,
}

/// Check a member in, optionally into a class
pub async fn check_in(
    State(state): State<ServerState>,
    grant: Grant,
    Json(req): Json<CheckInRequest>,
) -> AppResult<(StatusCode, ApiResponse<CheckInResult>)> {
    check_member_access(&state, &grant, req.member_id).await?;

    let result = service::check_in(
        &state,
        CheckIn {
            member_id: req.member_id,
            class_id: req.class_id,
            actor: Some(grant.user.id),
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Checked in", result),
    ))
}

/// Close an open session; no ledger effect
pub async fn check_out(
    State(state): State<ServerState>,
    grant: Grant,
    Path(attendance_id): Path<i64>,
) -> AppResult<ApiResponse<CheckOutResult>> {
    if !grant.is_any() {
        let record = service::get_attendance(&state, attendance_id).await?;
        check_member_access(&state, &grant, record.member_id).await?;
    }
    let result = service::check_out(&state, attendance_id).await?;
    Ok(ApiResponse::success_with_message("Checked out", result))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    grant: Grant,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Attendance>> {
    let record = service::get_attendance(&state, id).await?;
    check_member_access(&state, &grant, record.member_id).await?;
    Ok(ApiResponse::success(record))
}

/// One member's sessions, newest first
pub async fn member_history(
    State(state): State<ServerState>,
    grant: Grant,
    Path(member_id): Path<i64>,
    Query(range): Query<DateRangeParams>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<Attendance>> {
    check_member_access(&state, &grant, member_id).await?;
    let (from, to) = range.bounds()?;

    let filter = AttendanceFilter {
        member_id: Some(member_id),
        from,
        to,
        ..Default::default()
    };
    let (records, total) = state
        .db
        .query(attendance::list(&state.db.pool, filter, page.page(), page.limit()))
        .await?;
    Ok(Paginated::new(records, total, page.page(), page.limit()))
}

pub async fn member_stats(
    State(state): State<ServerState>,
    grant: Grant,
    Path(member_id): Path<i64>,
    Query(range): Query<DateRangeParams>,
) -> AppResult<ApiResponse<AttendanceStats>> {
    check_member_access(&state, &grant, member_id).await?;
    let (from, to) = range.bounds()?;
    let stats = state
        .db
        .query(attendance::stats(&state.db.pool, member_id, from, to))
        .await?;
    Ok(ApiResponse::success(stats))
}

/// Every open session
pub async fn active(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<Attendance>>> {
    let records = state.db.query(attendance::list_open(&state.db.pool)).await?;
    Ok(ApiResponse::success(records))
}

/// Sessions of one class, optionally on one day
pub async fn class_history(
    State(state): State<ServerState>,
    Path(class_id): Path<i64>,
    Query(day): Query<ClassDayQuery>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<Attendance>> {
    if state
        .db
        .query(class::find_by_id(&state.db.pool, class_id))
        .await?
        .is_none()
    {
        return Err(AppError::new(ErrorCode::ClassNotFound));
    }

    let (from, to) = date_bounds(day.date.as_deref(), day.date.as_deref())?;
    let filter = AttendanceFilter {
        class_id: Some(class_id),
        from,
        to,
        ..Default::default()
    };
    let (records, total) = state
        .db
        .query(attendance::list(&state.db.pool, filter, page.page(), page.limit()))
        .await?;
    Ok(Paginated::new(records, total, page.page(), page.limit()))
}
