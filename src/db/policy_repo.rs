// src/db/policy_repo.rs

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::{ListQuery, PageWindow}},
    models::policy::{Policy, PolicyFields},
};

pub struct NewPolicy<'a> {
    pub home_id: Uuid,
    pub title: &'a str,
    pub category: &'a str,
    pub version: &'a str,
    pub status: &'a str,
    pub document: &'a str,
    pub assigned_staff: &'a [Uuid],
    pub last_updated: NaiveDate,
}

#[derive(Clone)]
pub struct PolicyRepository {
    pool: PgPool,
}

impl PolicyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_policy(&self, policy: NewPolicy<'_>) -> Result<Policy, AppError> {
        let created = sqlx::query_as::<_, Policy>(
            r#"
            INSERT INTO policies (
                home_id, title, category, version, status, document, assigned_staff, last_updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(policy.home_id)
        .bind(policy.title)
        .bind(policy.category)
        .bind(policy.version)
        .bind(policy.status)
        .bind(policy.document)
        .bind(policy.assigned_staff)
        .bind(policy.last_updated)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn find_in_home(&self, id: Uuid, home_id: Uuid) -> Result<Option<Policy>, AppError> {
        let policy = sqlx::query_as::<_, Policy>("SELECT * FROM policies WHERE id = $1 AND home_id = $2")
            .bind(id)
            .bind(home_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(policy)
    }

    pub async fn update_policy(
        &self,
        id: Uuid,
        fields: &PolicyFields,
        document: Option<&str>,
    ) -> Result<Policy, AppError> {
        // Staff dropped from the assignment also lose their acknowledgement, keeping the
        // counter equal to the array length.
        let policy = sqlx::query_as::<_, Policy>(
            r#"
            WITH next AS (
                SELECT COALESCE($7::uuid[], assigned_staff) AS assigned
                FROM policies WHERE id = $1
            )
            UPDATE policies p SET
                title = COALESCE($2, p.title),
                category = COALESCE($3, p.category),
                version = COALESCE($4, p.version),
                last_updated = COALESCE($5, p.last_updated),
                status = COALESCE($6, p.status),
                assigned_staff = next.assigned,
                acknowledged_staff = ARRAY(
                    SELECT s FROM unnest(p.acknowledged_staff) AS s WHERE s = ANY(next.assigned)
                ),
                acknowledgements = cardinality(ARRAY(
                    SELECT s FROM unnest(p.acknowledged_staff) AS s WHERE s = ANY(next.assigned)
                )),
                document = COALESCE($8, p.document)
            FROM next
            WHERE p.id = $1
            RETURNING p.*
            "#,
        )
        .bind(id)
        .bind(fields.title.as_deref())
        .bind(fields.category.as_deref())
        .bind(fields.version.as_deref())
        .bind(fields.review_date)
        .bind(fields.priority.as_deref())
        .bind(fields.assigned_staff.as_deref())
        .bind(document)
        .fetch_one(&self.pool)
        .await?;
        Ok(policy)
    }

    pub async fn delete_policy(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM policies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Records one acknowledgement in a single statement; `None` when the staff id is
    /// already present (or the policy is gone).
    pub async fn acknowledge(&self, id: Uuid, staff_id: Uuid) -> Result<Option<Policy>, AppError> {
        let policy = sqlx::query_as::<_, Policy>(
            r#"
            UPDATE policies
            SET acknowledged_staff = array_append(acknowledged_staff, $2),
                acknowledgements = acknowledgements + 1
            WHERE id = $1 AND NOT ($2 = ANY(acknowledged_staff))
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(staff_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(policy)
    }

    pub async fn list_all(&self) -> Result<Vec<Policy>, AppError> {
        let policies = sqlx::query_as::<_, Policy>("SELECT * FROM policies ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(policies)
    }

    /// A page of the home's policies; `assigned_to` narrows it to one staff member's.
    pub async fn list_page(
        &self,
        home_id: Uuid,
        assigned_to: Option<Uuid>,
        query: &ListQuery,
        window: PageWindow,
    ) -> Result<(Vec<Policy>, i64), AppError> {
        let search = query.search_pattern();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM policies
            WHERE home_id = $1
              AND ($2::uuid IS NULL OR $2 = ANY(assigned_staff))
              AND ($3::text IS NULL OR title ILIKE $3)
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

        let policies = sqlx::query_as::<_, Policy>(
            r#"
            SELECT * FROM policies
            WHERE home_id = $1
              AND ($2::uuid IS NULL OR $2 = ANY(assigned_staff))
              AND ($3::text IS NULL OR title ILIKE $3)
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

        Ok((policies, total))
    }
}
