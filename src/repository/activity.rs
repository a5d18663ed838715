//! Activity log repository (audit trail sink)

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::activity::{ActivityLog, ActivityQuery, NewActivity},
};

#[derive(Clone)]
pub struct ActivityRepository {
    pool: Pool<Postgres>,
}

impl ActivityRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append one audit record
    pub async fn insert(&self, entry: &NewActivity) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (actor, action, entity_type, entity_id, entity_name, changes)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&entry.actor)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.entity_name)
        .bind(&entry.changes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// List audit records, newest first
    pub async fn list(&self, query: &ActivityQuery) -> AppResult<(Vec<ActivityLog>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(50).clamp(1, 200);
        let offset = (page - 1) * per_page;

        const FILTER: &str = r#"
            WHERE ($1::text IS NULL OR entity_type = $1)
              AND ($2::text IS NULL OR actor = $2)
        "#;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM activity_logs {}", FILTER))
                .bind(&query.entity_type)
                .bind(&query.actor)
                .fetch_one(&self.pool)
                .await?;

        let entries = sqlx::query_as::<_, ActivityLog>(&format!(
            "SELECT * FROM activity_logs {} ORDER BY id DESC LIMIT $3 OFFSET $4",
            FILTER
        ))
        .bind(&query.entity_type)
        .bind(&query.actor)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((entries, total))
    }
}
