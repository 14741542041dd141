//! Payment API Handlers

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use shared::models::{Payment, PaymentCreate, PaymentReceipt, RefundRequest};
use shared::{ApiResponse, AppResult, Paginated};

use crate::api::{caller_member, check_member_access};
use crate::auth::Grant;
use crate::core::ServerState;
use crate::db::repository::payment;
use crate::services::payment as service;
use crate::utils::extract::{Path, Query};
use crate::utils::{PaginationParams, ValidatedJson};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuery {
    pub member_id: Option<i64>,
}

/// Record a purchase and credit its tokens
pub async fn create(
    State(state): State<ServerState>,
    grant: Grant,
    ValidatedJson(req): ValidatedJson<PaymentCreate>,
) -> AppResult<(StatusCode, ApiResponse<PaymentReceipt>)> {
    let receipt = service::record_payment(&state, &req, grant.user.id).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Payment recorded", receipt),
    ))
}

/// Refund a payment, debiting the refunded tokens
pub async fn refund(
    State(state): State<ServerState>,
    grant: Grant,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<RefundRequest>,
) -> AppResult<ApiResponse<PaymentReceipt>> {
    let receipt = service::refund_payment(&state, id, &req, grant.user.id).await?;
    Ok(ApiResponse::success_with_message("Payment refunded", receipt))
}

/// All payments (admin) or the caller's own
pub async fn list(
    State(state): State<ServerState>,
    grant: Grant,
    Query(query): Query<PaymentQuery>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<Payment>> {
    let member_id = if grant.is_any() {
        query.member_id
    } else {
        let own = caller_member(&state, &grant.user).await?.id;
        if let Some(requested) = query.member_id {
            check_member_access(&state, &grant, requested).await?;
        }
        Some(own)
    };

    let (payments, total) = state
        .db
        .query(payment::list(&state.db.pool, member_id, page.page(), page.limit()))
        .await?;
    Ok(Paginated::new(payments, total, page.page(), page.limit()))
}

/// Payments of the calling member
pub async fn my_payments(
    State(state): State<ServerState>,
    grant: Grant,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<Payment>> {
    let own = caller_member(&state, &grant.user).await?;
    let (payments, total) = state
        .db
        .query(payment::list(&state.db.pool, Some(own.id), page.page(), page.limit()))
        .await?;
    Ok(Paginated::new(payments, total, page.page(), page.limit()))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    grant: Grant,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Payment>> {
    let found = service::get_payment(&state, id).await?;
    check_member_access(&state, &grant, found.member_id).await?;
    Ok(ApiResponse::success(found))
}
