//! Member profiles
//!
//! `token_balance` is written only by [`adjust_balance`], which the ledger
//! calls inside its unit of work.

use chrono::Utc;
use shared::models::{Member, MemberSelfUpdate};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use super::{RepoError, RepoResult, like_pattern, page_window};

const MEMBER_SELECT: &str = "SELECT m.id, m.user_id, u.name, u.email, u.phone, m.member_code, \
     m.token_balance, m.is_active, m.emergency_contact, m.notes, m.last_check_in, \
     m.check_in_count, m.created_at, m.updated_at \
     FROM member m JOIN app_user u ON u.id = m.user_id";

const MEMBER_FILTER: &str = "(?1 IS NULL OR u.name LIKE ?1 ESCAPE '\\' OR u.email LIKE ?1 ESCAPE '\\' \
     OR m.member_code LIKE ?1 ESCAPE '\\') AND (?2 IS NULL OR m.is_active = ?2)";

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<Member>> {
    let member = sqlx::query_as::<_, Member>(&format!("{MEMBER_SELECT} WHERE m.id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(member)
}

pub async fn find_by_user_id<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
) -> RepoResult<Option<Member>> {
    let member = sqlx::query_as::<_, Member>(&format!("{MEMBER_SELECT} WHERE m.user_id = ?"))
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(member)
}

/// Owning user of a member, for ownership checks
pub async fn owner_of<'e>(db: impl SqliteExecutor<'e>, member_id: i64) -> RepoResult<Option<i64>> {
    let owner: Option<i64> = sqlx::query_scalar("SELECT user_id FROM member WHERE id = ?")
        .bind(member_id)
        .fetch_optional(db)
        .await?;
    Ok(owner)
}

pub async fn list(
    pool: &SqlitePool,
    search: Option<&str>,
    is_active: Option<bool>,
    page: u32,
    limit: u32,
) -> RepoResult<(Vec<Member>, u64)> {
    let (limit, offset) = page_window(page, limit);
    let pattern = search.filter(|s| !s.trim().is_empty()).map(|s| like_pattern(s.trim()));

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM member m JOIN app_user u ON u.id = m.user_id WHERE {MEMBER_FILTER}"
    ))
    .bind(&pattern)
    .bind(is_active)
    .fetch_one(pool)
    .await?;

    let members = sqlx::query_as::<_, Member>(&format!(
        "{MEMBER_SELECT} WHERE {MEMBER_FILTER} ORDER BY m.created_at DESC, m.id DESC LIMIT ?3 OFFSET ?4"
    ))
    .bind(&pattern)
    .bind(is_active)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((members, total as u64))
}

/// Members who attended any class of the gym
pub async fn list_by_gym(
    pool: &SqlitePool,
    gym_id: i64,
    page: u32,
    limit: u32,
) -> RepoResult<(Vec<Member>, u64)> {
    let (limit, offset) = page_window(page, limit);
    let attended = "m.id IN (SELECT a.member_id FROM attendance a \
                    JOIN class c ON c.id = a.class_id WHERE c.gym_id = ?1)";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM member m WHERE {attended}"))
        .bind(gym_id)
        .fetch_one(pool)
        .await?;

    let members = sqlx::query_as::<_, Member>(&format!(
        "{MEMBER_SELECT} WHERE {attended} ORDER BY u.name, m.id LIMIT ?2 OFFSET ?3"
    ))
    .bind(gym_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((members, total as u64))
}

/// Every member matching the filter, for exports
pub async fn list_all(
    pool: &SqlitePool,
    search: Option<&str>,
    is_active: Option<bool>,
) -> RepoResult<Vec<Member>> {
    let pattern = search.filter(|s| !s.trim().is_empty()).map(|s| like_pattern(s.trim()));
    let members = sqlx::query_as::<_, Member>(&format!(
        "{MEMBER_SELECT} WHERE {MEMBER_FILTER} ORDER BY m.created_at, m.id"
    ))
    .bind(&pattern)
    .bind(is_active)
    .fetch_all(pool)
    .await?;
    Ok(members)
}

/// Create a member profile with a zero balance
///
/// Member codes are `MEM-YYYYMM-NNNN`, numbered within the month. Runs on the
/// writer connection, so the count and the insert cannot interleave.
pub async fn create(conn: &mut SqliteConnection, user_id: i64) -> RepoResult<Member> {
    let prefix = format!("MEM-{}-", Utc::now().format("%Y%m"));
    let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM member WHERE member_code LIKE ? || '%'")
        .bind(&prefix)
        .fetch_one(&mut *conn)
        .await?;
    let member_code = format!("{prefix}{:04}", taken + 1);

    let now = now_millis();
    let id = sqlx::query(
        "INSERT INTO member (user_id, member_code, token_balance, is_active, check_in_count, created_at, updated_at) \
         VALUES (?, ?, 0, 1, 0, ?, ?)",
    )
    .bind(user_id)
    .bind(&member_code)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("member vanished after insert".into()))
}

pub async fn update_self(
    conn: &mut SqliteConnection,
    id: i64,
    data: &MemberSelfUpdate,
) -> RepoResult<Member> {
    sqlx::query(
        "UPDATE member SET emergency_contact = COALESCE(?, emergency_contact), \
         notes = COALESCE(?, notes), updated_at = ? WHERE id = ?",
    )
    .bind(&data.emergency_contact)
    .bind(&data.notes)
    .bind(now_millis())
    .bind(id)
    .execute(&mut *conn)
    .await?;

    find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("member {id}")))
}

pub async fn set_active<'e>(db: impl SqliteExecutor<'e>, id: i64, is_active: bool) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE member SET is_active = ?, updated_at = ? WHERE id = ?")
        .bind(is_active)
        .bind(now_millis())
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

/// Apply a signed delta to the cached balance
///
/// The update is conditional on the result staying non-negative; `None`
/// means the member is missing or the debit is not covered.
pub async fn adjust_balance<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    delta: i64,
) -> RepoResult<Option<i64>> {
    let balance: Option<i64> = sqlx::query_scalar(
        "UPDATE member SET token_balance = token_balance + ?1, updated_at = ?2 \
         WHERE id = ?3 AND token_balance + ?1 >= 0 RETURNING token_balance",
    )
    .bind(delta)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(balance)
}

/// Check-in bookkeeping
pub async fn record_check_in<'e>(db: impl SqliteExecutor<'e>, id: i64, at: i64) -> RepoResult<()> {
    sqlx::query(
        "UPDATE member SET last_check_in = ?, check_in_count = check_in_count + 1, updated_at = ? WHERE id = ?",
    )
    .bind(at)
    .bind(at)
    .bind(id)
    .execute(db)
    .await?;
    Ok(())
}
