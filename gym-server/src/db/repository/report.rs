//! Read-only aggregates for the admin dashboard

use sqlx::SqlitePool;

use super::RepoResult;

/// Row counts shown on the dashboard
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct Counts {
    pub total_members: i64,
    pub active_members: i64,
    pub total_gyms: i64,
    pub total_classes: i64,
}

pub async fn counts(pool: &SqlitePool) -> RepoResult<Counts> {
    let counts = sqlx::query_as::<_, Counts>(
        "SELECT \
           (SELECT COUNT(*) FROM member) AS total_members, \
           (SELECT COUNT(*) FROM member WHERE is_active = 1) AS active_members, \
           (SELECT COUNT(*) FROM gym WHERE is_active = 1) AS total_gyms, \
           (SELECT COUNT(*) FROM class WHERE is_active = 1) AS total_classes",
    )
    .fetch_one(pool)
    .await?;
    Ok(counts)
}
