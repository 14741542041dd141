//! Payments

use chrono::Utc;
use shared::models::{Payment, PaymentMethod, PaymentStatus};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use super::{RepoError, RepoResult, page_window};

const PAYMENT_COLUMNS: &str = "id, member_id, amount, tokens, method, status, transaction_id, description, \
     refund_tokens, refund_reason, refunded_at, created_by, created_at, updated_at";

pub struct NewPayment<'a> {
    pub member_id: i64,
    pub amount: f64,
    pub tokens: i64,
    pub method: PaymentMethod,
    pub transaction_id: Option<&'a str>,
    pub description: Option<&'a str>,
    pub created_by: Option<i64>,
}

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(&format!("SELECT {PAYMENT_COLUMNS} FROM payment WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(payment)
}

/// Newest first; `member_id` narrows to one member
pub async fn list(
    pool: &SqlitePool,
    member_id: Option<i64>,
    page: u32,
    limit: u32,
) -> RepoResult<(Vec<Payment>, u64)> {
    let (limit, offset) = page_window(page, limit);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payment WHERE (?1 IS NULL OR member_id = ?1)")
        .bind(member_id)
        .fetch_one(pool)
        .await?;

    let payments = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payment WHERE (?1 IS NULL OR member_id = ?1) \
         ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
    ))
    .bind(member_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((payments, total as u64))
}

/// Insert a completed payment
///
/// Without a client transaction id one is generated as `PAY-YYYYMMDD-NNNN`,
/// numbered within the day on the writer connection.
pub async fn create(conn: &mut SqliteConnection, data: NewPayment<'_>) -> RepoResult<Payment> {
    let transaction_id = match data.transaction_id {
        Some(id) => id.trim().to_string(),
        None => {
            let prefix = format!("PAY-{}-", Utc::now().format("%Y%m%d"));
            let taken: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM payment WHERE transaction_id LIKE ? || '%'")
                    .bind(&prefix)
                    .fetch_one(&mut *conn)
                    .await?;
            format!("{prefix}{:04}", taken + 1)
        }
    };

    let now = now_millis();
    let id = sqlx::query(
        "INSERT INTO payment (member_id, amount, tokens, method, status, transaction_id, description, \
           created_by, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(data.member_id)
    .bind(data.amount)
    .bind(data.tokens)
    .bind(data.method)
    .bind(PaymentStatus::Completed)
    .bind(&transaction_id)
    .bind(data.description)
    .bind(data.created_by)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!("transaction id {transaction_id}")),
        other => other,
    })?
    .last_insert_rowid();

    find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("payment vanished after insert".into()))
}

/// Completed -> refunded; `false` if the payment was not in `completed`
pub async fn mark_refunded<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    refund_tokens: i64,
    reason: &str,
    at: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE payment SET status = 'refunded', refund_tokens = ?, refund_reason = ?, \
           refunded_at = ?, updated_at = ? \
         WHERE id = ? AND status = 'completed'",
    )
    .bind(refund_tokens)
    .bind(reason)
    .bind(at)
    .bind(at)
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();
    Ok(rows > 0)
}
