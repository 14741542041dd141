//! Attendance records

use shared::models::{Attendance, AttendanceStats, AttendanceStatus};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use super::{RepoError, RepoResult, page_window};

const ATTENDANCE_SELECT: &str = "SELECT a.id, a.member_id, u.name AS member_name, a.class_id, \
     c.name AS class_name, a.check_in, a.check_out, a.token_used, a.status, a.created_at \
     FROM attendance a \
     JOIN member m ON m.id = a.member_id \
     JOIN app_user u ON u.id = m.user_id \
     LEFT JOIN class c ON c.id = a.class_id";

const ATTENDANCE_FILTER: &str = "(?1 IS NULL OR a.member_id = ?1) AND (?2 IS NULL OR a.class_id = ?2) \
     AND (?3 IS NULL OR a.check_in >= ?3) AND (?4 IS NULL OR a.check_in <= ?4)";

/// Listing filter
#[derive(Debug, Clone, Copy, Default)]
pub struct AttendanceFilter {
    pub member_id: Option<i64>,
    pub class_id: Option<i64>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// Open a session; the unique partial index rejects a second open one
pub async fn insert(
    conn: &mut SqliteConnection,
    member_id: i64,
    class_id: Option<i64>,
    check_in: i64,
    token_used: i64,
) -> RepoResult<i64> {
    let id = sqlx::query(
        "INSERT INTO attendance (member_id, class_id, check_in, token_used, status, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(member_id)
    .bind(class_id)
    .bind(check_in)
    .bind(token_used)
    .bind(AttendanceStatus::Present)
    .bind(check_in)
    .execute(&mut *conn)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!("open attendance for member {member_id}")),
        other => other,
    })?
    .last_insert_rowid();
    Ok(id)
}

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<Attendance>> {
    let record = sqlx::query_as::<_, Attendance>(&format!("{ATTENDANCE_SELECT} WHERE a.id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(record)
}

pub async fn find_open_by_member<'e>(
    db: impl SqliteExecutor<'e>,
    member_id: i64,
) -> RepoResult<Option<Attendance>> {
    let record = sqlx::query_as::<_, Attendance>(&format!(
        "{ATTENDANCE_SELECT} WHERE a.member_id = ? AND a.check_out IS NULL"
    ))
    .bind(member_id)
    .fetch_optional(db)
    .await?;
    Ok(record)
}

/// Close an open session; `false` if it was already closed
pub async fn close<'e>(db: impl SqliteExecutor<'e>, id: i64, check_out: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE attendance SET check_out = MAX(?, check_in) WHERE id = ? AND check_out IS NULL",
    )
    .bind(check_out)
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();
    Ok(rows > 0)
}

/// Newest first
pub async fn list(
    pool: &SqlitePool,
    filter: AttendanceFilter,
    page: u32,
    limit: u32,
) -> RepoResult<(Vec<Attendance>, u64)> {
    let (limit, offset) = page_window(page, limit);

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM attendance a WHERE {ATTENDANCE_FILTER}"
    ))
    .bind(filter.member_id)
    .bind(filter.class_id)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_one(pool)
    .await?;

    let records = sqlx::query_as::<_, Attendance>(&format!(
        "{ATTENDANCE_SELECT} WHERE {ATTENDANCE_FILTER} ORDER BY a.check_in DESC, a.id DESC LIMIT ?5 OFFSET ?6"
    ))
    .bind(filter.member_id)
    .bind(filter.class_id)
    .bind(filter.from)
    .bind(filter.to)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((records, total as u64))
}

pub async fn list_all(pool: &SqlitePool, filter: AttendanceFilter) -> RepoResult<Vec<Attendance>> {
    let records = sqlx::query_as::<_, Attendance>(&format!(
        "{ATTENDANCE_SELECT} WHERE {ATTENDANCE_FILTER} ORDER BY a.check_in, a.id"
    ))
    .bind(filter.member_id)
    .bind(filter.class_id)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_all(pool)
    .await?;
    Ok(records)
}

/// Every session still open
pub async fn list_open(pool: &SqlitePool) -> RepoResult<Vec<Attendance>> {
    let records = sqlx::query_as::<_, Attendance>(&format!(
        "{ATTENDANCE_SELECT} WHERE a.check_out IS NULL ORDER BY a.check_in DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(records)
}

/// Visit statistics; hours and averages only count closed sessions
pub async fn stats(
    pool: &SqlitePool,
    member_id: i64,
    from: Option<i64>,
    to: Option<i64>,
) -> RepoResult<AttendanceStats> {
    let (total_visits, tokens_spent, closed_visits, total_ms): (i64, i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(token_used), 0), \
           COALESCE(SUM(CASE WHEN check_out IS NOT NULL THEN 1 ELSE 0 END), 0), \
           COALESCE(SUM(CASE WHEN check_out IS NOT NULL THEN check_out - check_in ELSE 0 END), 0) \
         FROM attendance \
         WHERE member_id = ?1 AND (?2 IS NULL OR check_in >= ?2) AND (?3 IS NULL OR check_in <= ?3)",
    )
    .bind(member_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    let total_minutes = total_ms as f64 / 60_000.0;
    let average_visit_length = if closed_visits > 0 {
        (total_minutes / closed_visits as f64 * 10.0).round() / 10.0
    } else {
        0.0
    };

    Ok(AttendanceStats {
        total_visits,
        total_hours: (total_minutes / 60.0 * 100.0).round() / 100.0,
        tokens_spent,
        average_visit_length,
    })
}
