// src/db/audit_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::{ListQuery, PageWindow}},
    models::audit::{AuditChecklist, CreateAuditChecklistPayload, UpdateAuditChecklistPayload},
};

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_item(
        &self,
        home_id: Uuid,
        payload: &CreateAuditChecklistPayload,
    ) -> Result<AuditChecklist, AppError> {
        let item = sqlx::query_as::<_, AuditChecklist>(
            r#"
            INSERT INTO audit_checklists (
                home_id, category, item, status, priority, due_date, assigned_to, comments
            )
            VALUES ($1, $2, $3, COALESCE($4, 'pending'), COALESCE($5, 'medium'), $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(home_id)
        .bind(&payload.category)
        .bind(&payload.item)
        .bind(payload.status.as_deref())
        .bind(payload.priority.as_deref())
        .bind(payload.due_date)
        .bind(payload.assigned_to)
        .bind(payload.comments.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn find_in_home(&self, id: Uuid, home_id: Uuid) -> Result<Option<AuditChecklist>, AppError> {
        let item = sqlx::query_as::<_, AuditChecklist>(
            "SELECT * FROM audit_checklists WHERE id = $1 AND home_id = $2",
        )
        .bind(id)
        .bind(home_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn update_item(
        &self,
        id: Uuid,
        payload: &UpdateAuditChecklistPayload,
    ) -> Result<AuditChecklist, AppError> {
        let item = sqlx::query_as::<_, AuditChecklist>(
            r#"
            UPDATE audit_checklists SET
                category = COALESCE($2, category),
                item = COALESCE($3, item),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                due_date = COALESCE($6, due_date),
                assigned_to = COALESCE($7, assigned_to),
                comments = COALESCE($8, comments)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.category.as_deref())
        .bind(payload.item.as_deref())
        .bind(payload.status.as_deref())
        .bind(payload.priority.as_deref())
        .bind(payload.due_date)
        .bind(payload.assigned_to)
        .bind(payload.comments.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn set_evidence(&self, id: Uuid, evidence: &[String]) -> Result<AuditChecklist, AppError> {
        let item = sqlx::query_as::<_, AuditChecklist>(
            "UPDATE audit_checklists SET evidence = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(evidence)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn delete_item(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM audit_checklists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_for_home(&self, home_id: Uuid) -> Result<Vec<AuditChecklist>, AppError> {
        let items = sqlx::query_as::<_, AuditChecklist>(
            "SELECT * FROM audit_checklists WHERE home_id = $1 ORDER BY created_at DESC",
        )
        .bind(home_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// A page of the home's checklist items; `assigned_to` narrows it to one staff member's.
    pub async fn list_page(
        &self,
        home_id: Uuid,
        assigned_to: Option<Uuid>,
        query: &ListQuery,
        window: PageWindow,
    ) -> Result<(Vec<AuditChecklist>, i64), AppError> {
        let search = query.search_pattern();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM audit_checklists
            WHERE home_id = $1
              AND ($2::uuid IS NULL OR assigned_to = $2)
              AND ($3::text IS NULL OR item ILIKE $3 OR comments ILIKE $3)
              AND ($4::text IS NULL OR LOWER(category) = LOWER($4))
              AND ($5::text IS NULL OR LOWER(status) = LOWER($5))
            "#,
        )
        .bind(home_id)
        .bind(assigned_to)
        .bind(search.as_deref())
        .bind(query.category())
        .bind(query.status())
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, AuditChecklist>(
            r#"
            SELECT * FROM audit_checklists
            WHERE home_id = $1
              AND ($2::uuid IS NULL OR assigned_to = $2)
              AND ($3::text IS NULL OR item ILIKE $3 OR comments ILIKE $3)
              AND ($4::text IS NULL OR LOWER(category) = LOWER($4))
              AND ($5::text IS NULL OR LOWER(status) = LOWER($5))
            ORDER BY created_at DESC, id DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(home_id)
        .bind(assigned_to)
        .bind(search.as_deref())
        .bind(query.category())
        .bind(query.status())
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((items, total))
    }
}
