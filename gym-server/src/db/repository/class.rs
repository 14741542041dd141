//! Classes and their participants

use shared::models::{Class, ClassCreate, ClassParticipant, ClassUpdate, Weekday};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use super::{RepoError, RepoResult, page_window};

const CLASS_COLUMNS: &str = "id, name, description, trainer, gym_id, day, start_time, duration_minutes, \
     max_capacity, current_enrollment, token_cost, is_active, created_at, updated_at";

const CLASS_FILTER: &str = "(?1 IS NULL OR day = ?1) AND (?2 IS NULL OR is_active = ?2) \
     AND (?3 IS NULL OR gym_id = ?3)";

/// Listing filter
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassFilter {
    pub day: Option<Weekday>,
    pub is_active: Option<bool>,
    pub gym_id: Option<i64>,
}

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<Class>> {
    let class = sqlx::query_as::<_, Class>(&format!("SELECT {CLASS_COLUMNS} FROM class WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(class)
}

pub async fn list(
    pool: &SqlitePool,
    filter: ClassFilter,
    page: u32,
    limit: u32,
) -> RepoResult<(Vec<Class>, u64)> {
    let (limit, offset) = page_window(page, limit);

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM class WHERE {CLASS_FILTER}"))
        .bind(filter.day)
        .bind(filter.is_active)
        .bind(filter.gym_id)
        .fetch_one(pool)
        .await?;

    // Weekday order, then start time
    let classes = sqlx::query_as::<_, Class>(&format!(
        "SELECT {CLASS_COLUMNS} FROM class WHERE {CLASS_FILTER} \
         ORDER BY CASE day WHEN 'monday' THEN 1 WHEN 'tuesday' THEN 2 WHEN 'wednesday' THEN 3 \
           WHEN 'thursday' THEN 4 WHEN 'friday' THEN 5 WHEN 'saturday' THEN 6 ELSE 7 END, \
           start_time, id \
         LIMIT ?4 OFFSET ?5"
    ))
    .bind(filter.day)
    .bind(filter.is_active)
    .bind(filter.gym_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((classes, total as u64))
}

/// Classes a member is enrolled in, most recent enrollment first
pub async fn list_for_member(
    pool: &SqlitePool,
    member_id: i64,
    page: u32,
    limit: u32,
) -> RepoResult<(Vec<Class>, u64)> {
    let (limit, offset) = page_window(page, limit);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM class_participant WHERE member_id = ?")
        .bind(member_id)
        .fetch_one(pool)
        .await?;

    // class_participant shares no column names with class
    let classes = sqlx::query_as::<_, Class>(&format!(
        "SELECT {CLASS_COLUMNS} FROM class JOIN class_participant ON class_id = id \
         WHERE member_id = ?1 ORDER BY enrolled_at DESC, id DESC LIMIT ?2 OFFSET ?3"
    ))
    .bind(member_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((classes, total as u64))
}

pub async fn list_all(pool: &SqlitePool, filter: ClassFilter) -> RepoResult<Vec<Class>> {
    let classes = sqlx::query_as::<_, Class>(&format!(
        "SELECT {CLASS_COLUMNS} FROM class WHERE {CLASS_FILTER} ORDER BY id"
    ))
    .bind(filter.day)
    .bind(filter.is_active)
    .bind(filter.gym_id)
    .fetch_all(pool)
    .await?;
    Ok(classes)
}

pub async fn create(
    conn: &mut SqliteConnection,
    data: &ClassCreate,
    gym_id: Option<i64>,
) -> RepoResult<Class> {
    let now = now_millis();
    let id = sqlx::query(
        "INSERT INTO class (name, description, trainer, gym_id, day, start_time, duration_minutes, \
           max_capacity, current_enrollment, token_cost, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, 1, ?, ?)",
    )
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(&data.trainer)
    .bind(gym_id)
    .bind(data.day)
    .bind(&data.start_time)
    .bind(data.duration_minutes)
    .bind(data.max_capacity)
    .bind(data.token_cost)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("class vanished after insert".into()))
}

/// COALESCE update
///
/// Capacity may not drop below the current enrollment; the caller checks
/// first, the schema CHECK backs it up.
pub async fn update(conn: &mut SqliteConnection, id: i64, data: &ClassUpdate) -> RepoResult<Class> {
    let rows = sqlx::query(
        "UPDATE class SET name = COALESCE(?, name), description = COALESCE(?, description), \
           trainer = COALESCE(?, trainer), day = COALESCE(?, day), start_time = COALESCE(?, start_time), \
           duration_minutes = COALESCE(?, duration_minutes), max_capacity = COALESCE(?, max_capacity), \
           token_cost = COALESCE(?, token_cost), is_active = COALESCE(?, is_active), updated_at = ? \
         WHERE id = ?",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(&data.trainer)
    .bind(data.day)
    .bind(&data.start_time)
    .bind(data.duration_minutes)
    .bind(data.max_capacity)
    .bind(data.token_cost)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if rows == 0 {
        return Err(RepoError::NotFound(format!("class {id}")));
    }
    find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("class {id}")))
}

/// Soft delete, only while nobody is enrolled
///
/// Returns `false` when the class has enrollments (or does not exist).
pub async fn deactivate_if_empty<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE class SET is_active = 0, updated_at = ? WHERE id = ? AND current_enrollment = 0",
    )
    .bind(now_millis())
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();
    Ok(rows > 0)
}

/// Take one seat if one is free; `false` when full
pub async fn increment_enrollment<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE class SET current_enrollment = current_enrollment + 1, updated_at = ? \
         WHERE id = ? AND current_enrollment < max_capacity",
    )
    .bind(now_millis())
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();
    Ok(rows > 0)
}

pub async fn decrement_enrollment<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE class SET current_enrollment = current_enrollment - 1, updated_at = ? \
         WHERE id = ? AND current_enrollment > 0",
    )
    .bind(now_millis())
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();
    Ok(rows > 0)
}

pub async fn is_participant<'e>(
    db: impl SqliteExecutor<'e>,
    class_id: i64,
    member_id: i64,
) -> RepoResult<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM class_participant WHERE class_id = ? AND member_id = ?")
            .bind(class_id)
            .bind(member_id)
            .fetch_optional(db)
            .await?;
    Ok(found.is_some())
}

pub async fn add_participant<'e>(
    db: impl SqliteExecutor<'e>,
    class_id: i64,
    member_id: i64,
    at: i64,
) -> RepoResult<()> {
    sqlx::query("INSERT INTO class_participant (class_id, member_id, enrolled_at) VALUES (?, ?, ?)")
        .bind(class_id)
        .bind(member_id)
        .bind(at)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn remove_participant<'e>(
    db: impl SqliteExecutor<'e>,
    class_id: i64,
    member_id: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM class_participant WHERE class_id = ? AND member_id = ?")
        .bind(class_id)
        .bind(member_id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

pub async fn participants(pool: &SqlitePool, class_id: i64) -> RepoResult<Vec<ClassParticipant>> {
    let list = sqlx::query_as::<_, ClassParticipant>(
        "SELECT p.member_id, m.member_code, u.name, p.enrolled_at \
         FROM class_participant p \
         JOIN member m ON m.id = p.member_id \
         JOIN app_user u ON u.id = m.user_id \
         WHERE p.class_id = ? ORDER BY p.enrolled_at, p.member_id",
    )
    .bind(class_id)
    .fetch_all(pool)
    .await?;
    Ok(list)
}

/// Owning user of the class's gym, if any
pub async fn gym_owner_of<'e>(db: impl SqliteExecutor<'e>, class_id: i64) -> RepoResult<Option<i64>> {
    let owner: Option<Option<i64>> = sqlx::query_scalar(
        "SELECT g.owner_id FROM class c LEFT JOIN gym g ON g.id = c.gym_id WHERE c.id = ?",
    )
    .bind(class_id)
    .fetch_optional(db)
    .await?;
    Ok(owner.flatten())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEnv;

    fn session(name: &str, day: Weekday) -> ClassCreate {
        ClassCreate {
            name: name.into(),
            description: None,
            trainer: None,
            gym_id: None,
            day,
            start_time: "07:00".into(),
            duration_minutes: 60,
            max_capacity: 5,
            token_cost: 1,
        }
    }

    #[tokio::test]
    async fn test_list_for_member_only_own_enrollments() {
        let env = TestEnv::new().await;
        let ada = env.member("ada@example.com").await;
        let bob = env.member("bob@example.com").await;
        let yoga = env.class(session("Yoga", Weekday::Monday)).await;
        let spin = env.class(session("Spin", Weekday::Tuesday)).await;
        env.class(session("Boxing", Weekday::Friday)).await;

        let writer = &env.state.db.writer;
        add_participant(writer, yoga.id, ada.id, 1_000).await.unwrap();
        add_participant(writer, spin.id, ada.id, 2_000).await.unwrap();
        add_participant(writer, spin.id, bob.id, 3_000).await.unwrap();

        let pool = &env.state.db.pool;
        let (classes, total) = list_for_member(pool, ada.id, 1, 20).await.unwrap();
        assert_eq!(total, 2);
        let names: Vec<_> = classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Spin", "Yoga"]);

        let (first_page, total) = list_for_member(pool, ada.id, 1, 1).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(first_page.len(), 1);

        let (none, total) = list_for_member(pool, 9_999, 1, 20).await.unwrap();
        assert!(none.is_empty());
        assert_eq!(total, 0);
    }
}
