//! Token ledger handlers

use axum::extract::State;
use serde::{Deserialize, Serialize};
use shared::models::{
    BalanceDrift, BalanceSummary, RelatedDocument, TokenAdjustment, TokenStats, TokenTransaction,
    TransactionType,
};
use shared::{ApiResponse, AppError, AppResult, Paginated};

use crate::api::{caller_member, check_member_access};
use crate::auth::Grant;
use crate::core::ServerState;
use crate::db::repository::token_transaction::TransactionFilter;
use crate::ledger::{self, LedgerEntry};
use crate::utils::extract::{Path, Query};
use crate::utils::{DateRangeParams, PaginationParams, ValidatedJson};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    /// Required for admin and gym callers; members default to their own
    pub member_id: Option<i64>,
    #[serde(rename = "type")]
    pub tx_type: Option<TransactionType>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentResult {
    pub transaction: TokenTransaction,
    pub balance: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub checked_at: i64,
    pub drift_count: usize,
    pub drift: Vec<BalanceDrift>,
}

pub async fn balance(
    State(state): State<ServerState>,
    grant: Grant,
    Path(member_id): Path<i64>,
) -> AppResult<ApiResponse<BalanceSummary>> {
    check_member_access(&state, &grant, member_id).await?;
    let summary = ledger::get_balance(&state.db, member_id).await?;
    Ok(ApiResponse::success(summary))
}

/// Ledger history, newest first
pub async fn transactions(
    State(state): State<ServerState>,
    grant: Grant,
    Query(query): Query<TransactionQuery>,
    Query(range): Query<DateRangeParams>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Paginated<TokenTransaction>> {
    let member_id = match query.member_id {
        Some(id) => {
            check_member_access(&state, &grant, id).await?;
            id
        }
        None if grant.is_any() => {
            return Err(AppError::validation("memberId is required"));
        }
        None => caller_member(&state, &grant.user).await?.id,
    };
    let (from, to) = range.bounds()?;

    let filter = TransactionFilter {
        member_id: Some(member_id),
        tx_type: query.tx_type,
        from,
        to,
    };
    let (items, total) =
        ledger::list_transactions(&state.db, filter, page.page(), page.limit()).await?;
    Ok(Paginated::new(items, total, page.page(), page.limit()))
}

async fn adjust(
    state: &ServerState,
    grant: &Grant,
    entry: LedgerEntry,
    reference: Option<String>,
) -> AppResult<AdjustmentResult> {
    let mut entry = entry
        .related(RelatedDocument::Adjustment)
        .created_by(grant.user.id);
    if let Some(reference) = reference {
        entry = entry.reference(reference.trim());
    }
    let recorded = ledger::record_transaction(&state.db, entry).await?;
    Ok(AdjustmentResult {
        transaction: recorded.transaction,
        balance: recorded.balance,
    })
}

/// Admin credit
pub async fn credit(
    State(state): State<ServerState>,
    grant: Grant,
    Path(member_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<TokenAdjustment>,
) -> AppResult<ApiResponse<AdjustmentResult>> {
    let description = req.description.unwrap_or_else(|| "Admin credit".into());
    let entry = LedgerEntry::credit(member_id, req.amount, description);
    let result = adjust(&state, &grant, entry, req.reference).await?;
    Ok(ApiResponse::success_with_message("Tokens credited", result))
}

/// Admin debit
pub async fn debit(
    State(state): State<ServerState>,
    grant: Grant,
    Path(member_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<TokenAdjustment>,
) -> AppResult<ApiResponse<AdjustmentResult>> {
    let description = req.description.unwrap_or_else(|| "Admin debit".into());
    let entry = LedgerEntry::debit(member_id, req.amount, description);
    let result = adjust(&state, &grant, entry, req.reference).await?;
    Ok(ApiResponse::success_with_message("Tokens debited", result))
}

pub async fn stats(
    State(state): State<ServerState>,
    Query(range): Query<DateRangeParams>,
) -> AppResult<ApiResponse<TokenStats>> {
    let (from, to) = range.bounds()?;
    let stats = ledger::stats(&state.db, from, to).await?;
    Ok(ApiResponse::success(stats))
}

/// Run reconciliation now; drift is reported, never corrected
pub async fn reconcile(
    State(state): State<ServerState>,
    grant: Grant,
) -> AppResult<ApiResponse<ReconcileReport>> {
    let drift = ledger::reconcile(&state.db).await?;
    if !drift.is_empty() {
        tracing::warn!(
            drift_count = drift.len(),
            requested_by = grant.user.id,
            "Ledger drift detected"
        );
    }
    Ok(ApiResponse::success(ReconcileReport {
        checked_at: shared::util::now_millis(),
        drift_count: drift.len(),
        drift,
    }))
}
