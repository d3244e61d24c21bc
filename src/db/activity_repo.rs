// src/db/activity_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::{ListQuery, PageWindow}},
    models::activity::{ActivityLog, NewActivityLog},
};

#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_log(&self, log: &NewActivityLog) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (user_id, user_name, action, category, details, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(log.user_id)
        .bind(&log.user_name)
        .bind(&log.action)
        .bind(&log.category)
        .bind(&log.details)
        .bind(&log.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_page(
        &self,
        user_ids: &[Uuid],
        query: &ListQuery,
        window: PageWindow,
    ) -> Result<(Vec<ActivityLog>, i64), AppError> {
        let search = query.search_pattern();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activity_logs
            WHERE user_id = ANY($1)
              AND ($2::text IS NULL OR action ILIKE $2 OR details ILIKE $2 OR user_name ILIKE $2)
              AND ($3::text IS NULL OR LOWER(category) = LOWER($3))
              AND ($4::text IS NULL OR LOWER(status) = LOWER($4))
            "#,
        )
        .bind(user_ids)
        .bind(search.as_deref())
        .bind(query.category())
        .bind(query.status())
        .fetch_one(&self.pool)
        .await?;

        let logs = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT * FROM activity_logs
            WHERE user_id = ANY($1)
              AND ($2::text IS NULL OR action ILIKE $2 OR details ILIKE $2 OR user_name ILIKE $2)
              AND ($3::text IS NULL OR LOWER(category) = LOWER($3))
              AND ($4::text IS NULL OR LOWER(status) = LOWER($4))
            ORDER BY created_at DESC, id DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(user_ids)
        .bind(search.as_deref())
        .bind(query.category())
        .bind(query.status())
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((logs, total))
    }
}
