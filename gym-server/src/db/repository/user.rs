//! User accounts

use shared::models::{Role, User};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use super::{RepoError, RepoResult, page_window};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, phone, is_active, last_login, created_at, updated_at";

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub phone: Option<&'a str>,
}

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM app_user WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

/// Case-insensitive (the column is `COLLATE NOCASE`)
pub async fn find_by_email<'e>(
    db: impl SqliteExecutor<'e>,
    email: &str,
) -> RepoResult<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM app_user WHERE email = ?"))
            .bind(email.trim())
            .fetch_optional(db)
            .await?;
    Ok(user)
}

pub async fn list(
    pool: &SqlitePool,
    role: Option<Role>,
    page: u32,
    limit: u32,
) -> RepoResult<(Vec<User>, u64)> {
    let (limit, offset) = page_window(page, limit);
    let role = role.map(|r| r.as_str());

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_user WHERE (?1 IS NULL OR role = ?1)")
        .bind(role)
        .fetch_one(pool)
        .await?;

    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM app_user WHERE (?1 IS NULL OR role = ?1) \
         ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
    ))
    .bind(role)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((users, total as u64))
}

pub async fn create(conn: &mut SqliteConnection, data: NewUser<'_>) -> RepoResult<User> {
    let now = now_millis();
    let id = sqlx::query(
        "INSERT INTO app_user (name, email, password_hash, role, phone, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(data.name.trim())
    .bind(data.email.trim())
    .bind(data.password_hash)
    .bind(data.role)
    .bind(data.phone)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!("email {}", data.email.trim())),
        other => other,
    })?
    .last_insert_rowid();

    find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("user vanished after insert".into()))
}

/// COALESCE update of the self-service fields
pub async fn update_profile(
    conn: &mut SqliteConnection,
    id: i64,
    name: Option<&str>,
    phone: Option<&str>,
    password_hash: Option<&str>,
) -> RepoResult<User> {
    let rows = sqlx::query(
        "UPDATE app_user SET name = COALESCE(?, name), phone = COALESCE(?, phone), \
         password_hash = COALESCE(?, password_hash), updated_at = ? WHERE id = ?",
    )
    .bind(name.map(str::trim))
    .bind(phone)
    .bind(password_hash)
    .bind(now_millis())
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if rows == 0 {
        return Err(RepoError::NotFound(format!("user {id}")));
    }
    find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("user {id}")))
}

pub async fn admin_update(
    conn: &mut SqliteConnection,
    id: i64,
    role: Option<Role>,
    is_active: Option<bool>,
) -> RepoResult<User> {
    let rows = sqlx::query(
        "UPDATE app_user SET role = COALESCE(?, role), is_active = COALESCE(?, is_active), \
         updated_at = ? WHERE id = ?",
    )
    .bind(role)
    .bind(is_active)
    .bind(now_millis())
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if rows == 0 {
        return Err(RepoError::NotFound(format!("user {id}")));
    }
    find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("user {id}")))
}

pub async fn set_active<'e>(db: impl SqliteExecutor<'e>, id: i64, is_active: bool) -> RepoResult<()> {
    sqlx::query("UPDATE app_user SET is_active = ?, updated_at = ? WHERE id = ?")
        .bind(is_active)
        .bind(now_millis())
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn touch_login<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<()> {
    sqlx::query("UPDATE app_user SET last_login = ? WHERE id = ?")
        .bind(now_millis())
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
