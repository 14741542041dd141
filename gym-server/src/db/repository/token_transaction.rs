//! Token ledger rows
//!
//! Append-only: the schema rejects UPDATE and DELETE with triggers, and this
//! module only ever inserts.

use shared::models::{
    BalanceDrift, RelatedDocument, TokenStats, TokenTransaction, TokenUsage, TransactionType,
};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use super::{RepoError, RepoResult, page_window};

const TX_COLUMNS: &str = "id, member_id, tx_type, amount, description, reference, related_kind, related_id, created_by, created_at";

const TX_FILTER: &str = "(?1 IS NULL OR member_id = ?1) AND (?2 IS NULL OR tx_type = ?2) \
     AND (?3 IS NULL OR created_at >= ?3) AND (?4 IS NULL OR created_at <= ?4)";

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    member_id: i64,
    tx_type: TransactionType,
    amount: i64,
    description: String,
    reference: String,
    related_kind: Option<String>,
    related_id: Option<i64>,
    created_by: Option<i64>,
    created_at: i64,
}

impl From<TransactionRow> for TokenTransaction {
    fn from(row: TransactionRow) -> Self {
        let related_document = row
            .related_kind
            .as_deref()
            .and_then(|kind| RelatedDocument::from_parts(kind, row.related_id));
        TokenTransaction {
            id: row.id,
            member_id: row.member_id,
            tx_type: row.tx_type,
            amount: row.amount,
            description: row.description,
            reference: row.reference,
            related_document,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

/// Entry to append
#[derive(Debug, Clone)]
pub struct NewEntry<'a> {
    pub member_id: i64,
    pub tx_type: TransactionType,
    pub amount: i64,
    pub description: &'a str,
    pub reference: &'a str,
    pub related: Option<RelatedDocument>,
    pub created_by: Option<i64>,
    pub created_at: i64,
}

/// Listing filter; every field optional
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    pub member_id: Option<i64>,
    pub tx_type: Option<TransactionType>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

pub async fn insert(conn: &mut SqliteConnection, entry: &NewEntry<'_>) -> RepoResult<TokenTransaction> {
    let id = sqlx::query(
        "INSERT INTO token_transaction \
         (member_id, tx_type, amount, description, reference, related_kind, related_id, created_by, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.member_id)
    .bind(entry.tx_type)
    .bind(entry.amount)
    .bind(entry.description)
    .bind(entry.reference)
    .bind(entry.related.map(|r| r.kind()))
    .bind(entry.related.and_then(|r| r.id()))
    .bind(entry.created_by)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!("reference {}", entry.reference)),
        other => other,
    })?
    .last_insert_rowid();

    find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("ledger entry vanished after insert".into()))
}

pub async fn find_by_id<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
) -> RepoResult<Option<TokenTransaction>> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {TX_COLUMNS} FROM token_transaction WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row.map(Into::into))
}

pub async fn find_by_reference<'e>(
    db: impl SqliteExecutor<'e>,
    reference: &str,
) -> RepoResult<Option<TokenTransaction>> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {TX_COLUMNS} FROM token_transaction WHERE reference = ?"
    ))
    .bind(reference)
    .fetch_optional(db)
    .await?;
    Ok(row.map(Into::into))
}

/// Newest first
pub async fn list(
    pool: &SqlitePool,
    filter: TransactionFilter,
    page: u32,
    limit: u32,
) -> RepoResult<(Vec<TokenTransaction>, u64)> {
    let (limit, offset) = page_window(page, limit);

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM token_transaction WHERE {TX_FILTER}"
    ))
    .bind(filter.member_id)
    .bind(filter.tx_type)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {TX_COLUMNS} FROM token_transaction WHERE {TX_FILTER} \
         ORDER BY created_at DESC, id DESC LIMIT ?5 OFFSET ?6"
    ))
    .bind(filter.member_id)
    .bind(filter.tx_type)
    .bind(filter.from)
    .bind(filter.to)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows.into_iter().map(Into::into).collect(), total as u64))
}

/// Every entry matching the filter, oldest first, for exports
pub async fn list_all(pool: &SqlitePool, filter: TransactionFilter) -> RepoResult<Vec<TokenTransaction>> {
    let rows = sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {TX_COLUMNS} FROM token_transaction WHERE {TX_FILTER} ORDER BY created_at, id"
    ))
    .bind(filter.member_id)
    .bind(filter.tx_type)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn recent(pool: &SqlitePool, limit: i64) -> RepoResult<Vec<TokenTransaction>> {
    let rows = sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {TX_COLUMNS} FROM token_transaction ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// `(total_credits, total_debits)` for one member
pub async fn totals<'e>(db: impl SqliteExecutor<'e>, member_id: i64) -> RepoResult<(i64, i64)> {
    let totals: (i64, i64) = sqlx::query_as(
        "SELECT \
           COALESCE(SUM(CASE WHEN tx_type = 'credit' THEN amount ELSE 0 END), 0), \
           COALESCE(SUM(CASE WHEN tx_type = 'debit' THEN amount ELSE 0 END), 0) \
         FROM token_transaction WHERE member_id = ?",
    )
    .bind(member_id)
    .fetch_one(db)
    .await?;
    Ok(totals)
}

pub async fn stats(pool: &SqlitePool, from: Option<i64>, to: Option<i64>) -> RepoResult<TokenStats> {
    let stats = sqlx::query_as::<_, TokenStats>(
        "SELECT \
           COALESCE(SUM(CASE WHEN tx_type = 'credit' THEN amount ELSE 0 END), 0) AS total_credits, \
           COALESCE(SUM(CASE WHEN tx_type = 'debit' THEN amount ELSE 0 END), 0) AS total_debits, \
           COALESCE(SUM(CASE WHEN tx_type = 'credit' THEN 1 ELSE 0 END), 0) AS credit_count, \
           COALESCE(SUM(CASE WHEN tx_type = 'debit' THEN 1 ELSE 0 END), 0) AS debit_count, \
           COALESCE(SUM(CASE WHEN tx_type = 'credit' THEN amount ELSE -amount END), 0) AS net_tokens \
         FROM token_transaction \
         WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at <= ?2)",
    )
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

/// Per-type totals since `since`
pub async fn usage_by_type(pool: &SqlitePool, since: i64) -> RepoResult<Vec<TokenUsage>> {
    let usage = sqlx::query_as::<_, TokenUsage>(
        "SELECT tx_type, SUM(amount) AS total, COUNT(*) AS count \
         FROM token_transaction WHERE created_at >= ? GROUP BY tx_type ORDER BY tx_type",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(usage)
}

/// Members whose cached balance differs from their ledger sum
pub async fn drift(pool: &SqlitePool) -> RepoResult<Vec<BalanceDrift>> {
    let drift = sqlx::query_as::<_, BalanceDrift>(
        "SELECT m.id AS member_id, m.member_code, m.token_balance AS cached_balance, \
           COALESCE(SUM(CASE WHEN t.tx_type = 'credit' THEN t.amount ELSE -t.amount END), 0) AS ledger_balance \
         FROM member m LEFT JOIN token_transaction t ON t.member_id = m.id \
         GROUP BY m.id, m.member_code, m.token_balance \
         HAVING m.token_balance != ledger_balance \
         ORDER BY m.id",
    )
    .fetch_all(pool)
    .await?;
    Ok(drift)
}
