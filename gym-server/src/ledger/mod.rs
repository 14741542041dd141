//! Token ledger
//!
//! The ledger is the source of truth for token balances. Every balance change
//! is one appended [`TokenTransaction`] plus the matching update of the
//! member's cached `token_balance`, written in the same transaction on the
//! writer connection.
//!
//! [`record`] is the building block: it runs inside a caller-owned
//! transaction so check-in, payment and refund can co-locate their own writes
//! in the same unit of work. [`record_transaction`] wraps it for standalone
//! admin adjustments.

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use shared::models::{
    BalanceDrift, BalanceSummary, RelatedDocument, TokenStats, TokenTransaction, TransactionType,
};
use shared::util::now_millis;
use shared::{AppError, AppResult, ErrorCode};
use sqlx::SqliteConnection;

use crate::db::DbService;
use crate::db::repository::token_transaction::{NewEntry, TransactionFilter};
use crate::db::repository::{RepoError, member, token_transaction};


/// A balance change to record
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub member_id: i64,
    pub tx_type: TransactionType,
    pub amount: i64,
    pub description: String,
    /// Idempotency key; generated when `None`
    pub reference: Option<String>,
    pub related: Option<RelatedDocument>,
    /// Acting user
    pub created_by: Option<i64>,
}

impl LedgerEntry {
    pub fn credit(member_id: i64, amount: i64, description: impl Into<String>) -> Self {
        Self {
            member_id,
            tx_type: TransactionType::Credit,
            amount,
            description: description.into(),
            reference: None,
            related: None,
            created_by: None,
        }
    }

    pub fn debit(member_id: i64, amount: i64, description: impl Into<String>) -> Self {
        Self {
            tx_type: TransactionType::Debit,
            ..Self::credit(member_id, amount, description)
        }
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn related(mut self, related: RelatedDocument) -> Self {
        self.related = Some(related);
        self
    }

    pub fn created_by(mut self, user_id: i64) -> Self {
        self.created_by = Some(user_id);
        self
    }
}

/// Outcome of a recorded entry
#[derive(Debug, Clone)]
pub struct Recorded {
    pub transaction: TokenTransaction,
    /// Balance after the entry
    pub balance: i64,
}

/// `TXN-YYYYMMDD-XXXXXX`
pub fn generate_reference() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("TXN-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

/// Record one entry inside the caller's transaction
///
/// Checks run before any write: positive amount, member exists, debit is
/// covered. The insert rejects a reused reference; the balance update is
/// conditional on staying non-negative. The caller commits, or drops the
/// transaction to roll both writes back.
pub async fn record(conn: &mut SqliteConnection, entry: LedgerEntry) -> AppResult<Recorded> {
    if entry.amount <= 0 {
        return Err(AppError::with_message(
            ErrorCode::InvalidTokenAmount,
            "Amount must be a positive integer",
        ));
    }

    let member = member::find_by_id(&mut *conn, entry.member_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;

    if entry.tx_type == TransactionType::Debit && member.token_balance < entry.amount {
        return Err(insufficient_balance(member.token_balance, entry.amount));
    }

    let reference = entry.reference.clone().unwrap_or_else(generate_reference);
    let transaction = insert_entry(conn, &entry, &reference).await?;

    let balance = apply_balance(conn, entry.member_id, entry.tx_type.signed(entry.amount))
        .await?
        .ok_or_else(|| insufficient_balance(member.token_balance, entry.amount))?;

    tracing::info!(
        member_id = entry.member_id,
        tx_type = entry.tx_type.as_str(),
        amount = entry.amount,
        reference = %reference,
        balance,
        "Ledger entry recorded"
    );

    Ok(Recorded {
        transaction,
        balance,
    })
}

/// Append the ledger row only
pub(crate) async fn insert_entry(
    conn: &mut SqliteConnection,
    entry: &LedgerEntry,
    reference: &str,
) -> AppResult<TokenTransaction> {
    let row = NewEntry {
        member_id: entry.member_id,
        tx_type: entry.tx_type,
        amount: entry.amount,
        description: &entry.description,
        reference,
        related: entry.related,
        created_by: entry.created_by,
        created_at: now_millis(),
    };
    match token_transaction::insert(conn, &row).await {
        Ok(tx) => Ok(tx),
        Err(RepoError::Duplicate(_)) => Err(AppError::with_message(
            ErrorCode::DuplicateReference,
            format!("Reference {reference} has already been used"),
        )
        .with_detail("reference", reference)),
        Err(e) => Err(e.into()),
    }
}

/// Update the cached balance only; `None` when the result would go negative
pub(crate) async fn apply_balance(
    conn: &mut SqliteConnection,
    member_id: i64,
    delta: i64,
) -> AppResult<Option<i64>> {
    Ok(member::adjust_balance(&mut *conn, member_id, delta).await?)
}

fn insufficient_balance(balance: i64, requested: i64) -> AppError {
    AppError::new(ErrorCode::InsufficientBalance)
        .with_detail("balance", balance)
        .with_detail("requested", requested)
}

/// Record a standalone entry in its own transaction
pub async fn record_transaction(db: &DbService, entry: LedgerEntry) -> AppResult<Recorded> {
    db.bounded(async {
        let mut tx = db.writer.begin().await.map_err(RepoError::from)?;
        let recorded = record(&mut *tx, entry).await?;
        tx.commit().await.map_err(RepoError::from)?;
        Ok(recorded)
    })
    .await
}

/// Balance computed from the ledger
pub async fn get_balance(db: &DbService, member_id: i64) -> AppResult<BalanceSummary> {
    db.bounded(async {
        if member::owner_of(&db.pool, member_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::MemberNotFound));
        }
        let (total_credits, total_debits) = token_transaction::totals(&db.pool, member_id).await?;
        Ok(BalanceSummary {
            member_id,
            balance: total_credits - total_debits,
            total_credits,
            total_debits,
        })
    })
    .await
}

/// Entries matching `filter`, newest first
pub async fn list_transactions(
    db: &DbService,
    filter: TransactionFilter,
    page: u32,
    limit: u32,
) -> AppResult<(Vec<TokenTransaction>, u64)> {
    db.bounded(async { Ok(token_transaction::list(&db.pool, filter, page, limit).await?) })
        .await
}

pub async fn stats(db: &DbService, from: Option<i64>, to: Option<i64>) -> AppResult<TokenStats> {
    db.bounded(async { Ok(token_transaction::stats(&db.pool, from, to).await?) })
        .await
}

/// Members whose cached balance disagrees with the ledger
///
/// Report only; corrections are new offsetting entries made by an admin.
pub async fn reconcile(db: &DbService) -> AppResult<Vec<BalanceDrift>> {
    db.bounded(async { Ok(token_transaction::drift(&db.pool).await?) })
        .await
}
