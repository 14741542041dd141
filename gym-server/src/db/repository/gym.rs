//! Gyms

use shared::models::{Address, Gym, GymStats, GymUpdate, OperatingHours};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use super::{RepoError, RepoResult, like_pattern, page_window};

const GYM_COLUMNS: &str = "id, owner_id, name, email, phone, street, city, state, country, pincode, \
     weekday_open, weekday_close, weekend_open, weekend_close, is_active, created_at, updated_at";

pub struct NewGym<'a> {
    pub owner_id: i64,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub address: &'a Address,
    pub hours: &'a OperatingHours,
}

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<Gym>> {
    let gym = sqlx::query_as::<_, Gym>(&format!("SELECT {GYM_COLUMNS} FROM gym WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(gym)
}

pub async fn find_by_owner<'e>(db: impl SqliteExecutor<'e>, owner_id: i64) -> RepoResult<Option<Gym>> {
    let gym = sqlx::query_as::<_, Gym>(&format!("SELECT {GYM_COLUMNS} FROM gym WHERE owner_id = ?"))
        .bind(owner_id)
        .fetch_optional(db)
        .await?;
    Ok(gym)
}

/// Paginated listing; `active_only` hides deactivated gyms from the public
pub async fn list(
    pool: &SqlitePool,
    name: Option<&str>,
    active_only: bool,
    page: u32,
    limit: u32,
) -> RepoResult<(Vec<Gym>, u64)> {
    let (limit, offset) = page_window(page, limit);
    let pattern = name.filter(|s| !s.trim().is_empty()).map(|s| like_pattern(s.trim()));
    let filter = "(?1 IS NULL OR name LIKE ?1 ESCAPE '\\' OR city LIKE ?1 ESCAPE '\\') \
                  AND (?2 = 0 OR is_active = 1)";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM gym WHERE {filter}"))
        .bind(&pattern)
        .bind(active_only)
        .fetch_one(pool)
        .await?;

    let gyms = sqlx::query_as::<_, Gym>(&format!(
        "SELECT {GYM_COLUMNS} FROM gym WHERE {filter} ORDER BY name, id LIMIT ?3 OFFSET ?4"
    ))
    .bind(&pattern)
    .bind(active_only)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((gyms, total as u64))
}

pub async fn list_all(pool: &SqlitePool, is_active: Option<bool>) -> RepoResult<Vec<Gym>> {
    let gyms = sqlx::query_as::<_, Gym>(&format!(
        "SELECT {GYM_COLUMNS} FROM gym WHERE (?1 IS NULL OR is_active = ?1) ORDER BY id"
    ))
    .bind(is_active)
    .fetch_all(pool)
    .await?;
    Ok(gyms)
}

pub async fn create(conn: &mut SqliteConnection, data: NewGym<'_>) -> RepoResult<Gym> {
    let now = now_millis();
    let id = sqlx::query(
        "INSERT INTO gym (owner_id, name, email, phone, street, city, state, country, pincode, \
           weekday_open, weekday_close, weekend_open, weekend_close, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(data.owner_id)
    .bind(data.name.trim())
    .bind(data.email.trim())
    .bind(data.phone)
    .bind(&data.address.street)
    .bind(&data.address.city)
    .bind(&data.address.state)
    .bind(&data.address.country)
    .bind(&data.address.pincode)
    .bind(&data.hours.weekday_open)
    .bind(&data.hours.weekday_close)
    .bind(&data.hours.weekend_open)
    .bind(&data.hours.weekend_close)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!("gym email {}", data.email.trim())),
        other => other,
    })?
    .last_insert_rowid();

    find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("gym vanished after insert".into()))
}

pub async fn update(conn: &mut SqliteConnection, id: i64, data: &GymUpdate) -> RepoResult<Gym> {
    let address = data.address.clone().unwrap_or_default();
    let hours = data.operating_hours.as_ref();

    let rows = sqlx::query(
        "UPDATE gym SET name = COALESCE(?, name), phone = COALESCE(?, phone), \
           street = COALESCE(?, street), city = COALESCE(?, city), state = COALESCE(?, state), \
           country = COALESCE(?, country), pincode = COALESCE(?, pincode), \
           weekday_open = COALESCE(?, weekday_open), weekday_close = COALESCE(?, weekday_close), \
           weekend_open = COALESCE(?, weekend_open), weekend_close = COALESCE(?, weekend_close), \
           is_active = COALESCE(?, is_active), updated_at = ? \
         WHERE id = ?",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.phone)
    .bind(&address.street)
    .bind(&address.city)
    .bind(&address.state)
    .bind(&address.country)
    .bind(&address.pincode)
    .bind(hours.map(|h| h.weekday_open.as_str()))
    .bind(hours.map(|h| h.weekday_close.as_str()))
    .bind(hours.map(|h| h.weekend_open.as_str()))
    .bind(hours.map(|h| h.weekend_close.as_str()))
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if rows == 0 {
        return Err(RepoError::NotFound(format!("gym {id}")));
    }
    find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("gym {id}")))
}

pub async fn set_active<'e>(db: impl SqliteExecutor<'e>, id: i64, is_active: bool) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE gym SET is_active = ?, updated_at = ? WHERE id = ?")
        .bind(is_active)
        .bind(now_millis())
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

pub async fn stats(pool: &SqlitePool, gym: &Gym) -> RepoResult<GymStats> {
    let (total_classes, active_classes, total_enrollment): (i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(is_active), 0), COALESCE(SUM(current_enrollment), 0) \
         FROM class WHERE gym_id = ?",
    )
    .bind(gym.id)
    .fetch_one(pool)
    .await?;

    let unique_members: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT a.member_id) FROM attendance a \
         JOIN class c ON c.id = a.class_id WHERE c.gym_id = ?",
    )
    .bind(gym.id)
    .fetch_one(pool)
    .await?;

    Ok(GymStats {
        gym_id: gym.id,
        total_classes,
        active_classes,
        total_enrollment,
        unique_members,
        is_active: gym.is_active,
    })
}
