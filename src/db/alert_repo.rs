// src/db/alert_repo.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageWindow},
    models::alert::{Alert, AlertDraft, AlertListQuery, AlertStatus},
};

#[derive(Clone)]
pub struct AlertRepository {
    pool: PgPool,
}

impl AlertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the draft unless an active alert with the same (staff, title) exists.
    /// The partial unique index `alerts_active_unique` makes this race-free.
    pub async fn insert_if_absent(&self, draft: &AlertDraft, at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO alerts (staff_id, title, description, severity, category, status, date)
            VALUES ($1, $2, $3, $4, $5, 'active', $6)
            ON CONFLICT (staff_id, title) WHERE status = 'active' DO NOTHING
            "#,
        )
        .bind(draft.staff_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.severity)
        .bind(&draft.category)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Alert>, AppError> {
        let alert = sqlx::query_as::<_, Alert>("SELECT * FROM alerts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(alert)
    }

    pub async fn dismiss(&self, id: Uuid) -> Result<Alert, AppError> {
        let alert = sqlx::query_as::<_, Alert>(
            "UPDATE alerts SET status = 'dismissed' WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(alert)
    }

    pub async fn count_active(&self, staff_ids: &[Uuid]) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM alerts WHERE staff_id = ANY($1) AND status = 'active'",
        )
        .bind(staff_ids)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn list_page(
        &self,
        staff_ids: &[Uuid],
        query: &AlertListQuery,
        window: PageWindow,
    ) -> Result<(Vec<Alert>, i64), AppError> {
        let search = query.search_pattern();
        let status: AlertStatus = query.status();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM alerts
            WHERE staff_id = ANY($1)
              AND status = $2
              AND ($3::alert_severity IS NULL OR severity = $3)
              AND ($4::text IS NULL OR LOWER(category) = LOWER($4))
              AND ($5::text IS NULL OR title ILIKE $5 OR description ILIKE $5)
            "#,
        )
        .bind(staff_ids)
        .bind(status)
        .bind(query.severity)
        .bind(query.category())
        .bind(search.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let alerts = sqlx::query_as::<_, Alert>(
            r#"
            SELECT * FROM alerts
            WHERE staff_id = ANY($1)
              AND status = $2
              AND ($3::alert_severity IS NULL OR severity = $3)
              AND ($4::text IS NULL OR LOWER(category) = LOWER($4))
              AND ($5::text IS NULL OR title ILIKE $5 OR description ILIKE $5)
            ORDER BY date DESC, id DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(staff_ids)
        .bind(status)
        .bind(query.severity)
        .bind(query.category())
        .bind(search.as_deref())
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((alerts, total))
    }
}
