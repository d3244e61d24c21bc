// src/db/report_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::{ListQuery, PageWindow}},
    models::report::{Report, UpdateReportPayload, INITIAL_REPORT_STATUS},
};

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_report(
        &self,
        title: &str,
        report_type: &str,
        category: &str,
        created_by: Uuid,
    ) -> Result<Report, AppError> {
        let report = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (title, type, category, status, created_by, date)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(report_type)
        .bind(category)
        .bind(INITIAL_REPORT_STATUS)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(report)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>, AppError> {
        let report = sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(report)
    }

    pub async fn find_owned(&self, id: Uuid, owner: Uuid) -> Result<Option<Report>, AppError> {
        let report = sqlx::query_as::<_, Report>(
            "SELECT * FROM reports WHERE id = $1 AND created_by = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(report)
    }

    pub async fn update_report(&self, id: Uuid, payload: &UpdateReportPayload) -> Result<Report, AppError> {
        let report = sqlx::query_as::<_, Report>(
            r#"
            UPDATE reports SET
                title = COALESCE($2, title),
                type = COALESCE($3, type),
                category = COALESCE($4, category),
                status = COALESCE($5, status)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.title.as_deref())
        .bind(payload.report_type.as_deref())
        .bind(payload.category.as_deref())
        .bind(payload.status.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(report)
    }

    pub async fn delete_report(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn latest_of_type(&self, authors: &[Uuid], report_type: &str) -> Result<Option<Report>, AppError> {
        let report = sqlx::query_as::<_, Report>(
            r#"
            SELECT * FROM reports
            WHERE created_by = ANY($1) AND LOWER(type) = LOWER($2)
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(authors)
        .bind(report_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(report)
    }

    pub async fn recent(&self, authors: &[Uuid], limit: i64) -> Result<Vec<Report>, AppError> {
        let reports = sqlx::query_as::<_, Report>(
            "SELECT * FROM reports WHERE created_by = ANY($1) ORDER BY created_at DESC LIMIT $2",
        )
        .bind(authors)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(reports)
    }

    pub async fn list_page(
        &self,
        authors: &[Uuid],
        query: &ListQuery,
        window: PageWindow,
    ) -> Result<(Vec<Report>, i64), AppError> {
        let search = query.search_pattern();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reports
            WHERE created_by = ANY($1)
              AND ($2::text IS NULL OR title ILIKE $2)
              AND ($3::text IS NULL OR LOWER(category) = LOWER($3))
              AND ($4::text IS NULL OR LOWER(status) = LOWER($4))
            "#,
        )
        .bind(authors)
        .bind(search.as_deref())
        .bind(query.category())
        .bind(query.status())
        .fetch_one(&self.pool)
        .await?;

        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT * FROM reports
            WHERE created_by = ANY($1)
              AND ($2::text IS NULL OR title ILIKE $2)
              AND ($3::text IS NULL OR LOWER(category) = LOWER($3))
              AND ($4::text IS NULL OR LOWER(status) = LOWER($4))
            ORDER BY created_at DESC, id DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(authors)
        .bind(search.as_deref())
        .bind(query.category())
        .bind(query.status())
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((reports, total))
    }
}
