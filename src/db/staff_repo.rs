// src/db/staff_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError, pagination::{ListQuery, PageWindow}},
    models::staff::{CreateStaffPayload, EmploymentRecord, Staff, StaffBrief, UpdateStaffPayload},
};

const DUPLICATE_STAFF_EMAIL: &str = "Staff with this email already exists.";

#[derive(Clone)]
pub struct StaffRepository {
    pool: PgPool,
}

impl StaffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  WRITES
    // =========================================================================

    pub async fn create_staff<'e, E>(
        &self,
        executor: E,
        home_id: Uuid,
        user_id: Option<Uuid>,
        payload: &CreateStaffPayload,
    ) -> Result<Staff, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Staff>(
            r#"
            INSERT INTO staff (
                home_id, user_id, name, email, role, status,
                dbs_check_status, dbs_expiry_date,
                training_safeguarding_status, training_safeguarding_date,
                training_first_aid_status, training_first_aid_date,
                training_medication_status, training_medication_date
            )
            VALUES (
                $1, $2, $3, $4, $5, COALESCE($6, 'active'),
                COALESCE($7, 'pending'), $8,
                COALESCE($9, 'pending'), $10,
                COALESCE($11, 'pending'), $12,
                COALESCE($13, 'pending'), $14
            )
            RETURNING *
            "#,
        )
        .bind(home_id)
        .bind(user_id)
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.role)
        .bind(payload.status.as_deref())
        .bind(payload.dbs_check_status.as_deref())
        .bind(payload.dbs_expiry_date)
        .bind(payload.training_safeguarding_status.as_deref())
        .bind(payload.training_safeguarding_date)
        .bind(payload.training_first_aid_status.as_deref())
        .bind(payload.training_first_aid_date)
        .bind(payload.training_medication_status.as_deref())
        .bind(payload.training_medication_date)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_STAFF_EMAIL))
    }

    /// Merges the provided fields over the stored row.
    pub async fn update_staff<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateStaffPayload,
    ) -> Result<Staff, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Staff>(
            r#"
            UPDATE staff SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                status = COALESCE($5, status),
                dbs_check_status = COALESCE($6, dbs_check_status),
                dbs_expiry_date = COALESCE($7, dbs_expiry_date),
                training_safeguarding_status = COALESCE($8, training_safeguarding_status),
                training_safeguarding_date = COALESCE($9, training_safeguarding_date),
                training_first_aid_status = COALESCE($10, training_first_aid_status),
                training_first_aid_date = COALESCE($11, training_first_aid_date),
                training_medication_status = COALESCE($12, training_medication_status),
                training_medication_date = COALESCE($13, training_medication_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref())
        .bind(payload.email.as_deref())
        .bind(payload.role.as_deref())
        .bind(payload.status.as_deref())
        .bind(payload.dbs_check_status.as_deref())
        .bind(payload.dbs_expiry_date)
        .bind(payload.training_safeguarding_status.as_deref())
        .bind(payload.training_safeguarding_date)
        .bind(payload.training_first_aid_status.as_deref())
        .bind(payload.training_first_aid_date)
        .bind(payload.training_medication_status.as_deref())
        .bind(payload.training_medication_date)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_STAFF_EMAIL))
    }

    pub async fn update_records(
        &self,
        id: Uuid,
        certificates: Option<&[String]>,
        employment_history: Option<&[EmploymentRecord]>,
    ) -> Result<Staff, AppError> {
        let staff = sqlx::query_as::<_, Staff>(
            r#"
            UPDATE staff SET
                training_certificates = COALESCE($2, training_certificates),
                employment_history = COALESCE($3, employment_history),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(certificates)
        .bind(employment_history.map(Json))
        .fetch_one(&self.pool)
        .await?;
        Ok(staff)
    }

    /// Keeps the linked staff row in step with its login's name and email.
    pub async fn sync_from_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        name: &str,
        email: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE staff SET name = $2, email = $3, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id)
            .bind(name)
            .bind(email)
            .execute(executor)
            .await
            .map_err(|e| map_unique_violation(e, DUPLICATE_STAFF_EMAIL))?;
        Ok(())
    }

    pub async fn link_user<'e, E>(&self, executor: E, staff_id: Uuid, user_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE staff SET user_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(staff_id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete_staff<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM staff WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Removes the staff profile belonging to a login, linked or matched by email.
    pub async fn delete_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        email: &str,
        home_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM staff
            WHERE user_id = $1
               OR (user_id IS NULL AND LOWER(email) = LOWER($2) AND home_id = $3)
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(home_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  READS
    // =========================================================================

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Staff>, AppError> {
        let staff = sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(staff)
    }

    pub async fn find_by_email<'e, E>(&self, executor: E, email: &str) -> Result<Option<Staff>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staff = sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(executor)
            .await?;
        Ok(staff)
    }

    /// The staff profile of a login: the linked row, else an unlinked row with the same email in the home.
    pub async fn find_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        email: &str,
        home_id: Uuid,
    ) -> Result<Option<Staff>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staff = sqlx::query_as::<_, Staff>(
            r#"
            SELECT * FROM staff
            WHERE user_id = $1
               OR (user_id IS NULL AND LOWER(email) = LOWER($2) AND home_id = $3)
            ORDER BY (user_id IS NOT NULL) DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(home_id)
        .fetch_optional(executor)
        .await?;
        Ok(staff)
    }

    /// Ids of staff belonging to the home, directly or through one of its users.
    pub async fn list_visible_ids(&self, home_id: Uuid, user_ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM staff WHERE home_id = $1 OR user_id = ANY($2)",
        )
        .bind(home_id)
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Staff>, AppError> {
        let staff = sqlx::query_as::<_, Staff>(
            "SELECT * FROM staff WHERE id = ANY($1) ORDER BY created_at DESC",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(staff)
    }

    pub async fn list_all(&self) -> Result<Vec<Staff>, AppError> {
        let staff = sqlx::query_as::<_, Staff>("SELECT * FROM staff ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(staff)
    }

    pub async fn find_briefs(&self, ids: &[Uuid]) -> Result<Vec<StaffBrief>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let staff = sqlx::query_as::<_, StaffBrief>(
            "SELECT id, name, email, role, status FROM staff WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(staff)
    }

    pub async fn list_page(
        &self,
        visible_ids: &[Uuid],
        query: &ListQuery,
        window: PageWindow,
    ) -> Result<(Vec<Staff>, i64), AppError> {
        let search = query.search_pattern();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM staff
            WHERE id = ANY($1)
              AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2)
              AND ($3::text IS NULL OR LOWER(status) = LOWER($3))
              AND ($4::text IS NULL OR LOWER(role) = LOWER($4))
            "#,
        )
        .bind(visible_ids)
        .bind(search.as_deref())
        .bind(query.status())
        .bind(query.category())
        .fetch_one(&self.pool)
        .await?;

        let staff = sqlx::query_as::<_, Staff>(
            r#"
            SELECT * FROM staff
            WHERE id = ANY($1)
              AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2)
              AND ($3::text IS NULL OR LOWER(status) = LOWER($3))
              AND ($4::text IS NULL OR LOWER(role) = LOWER($4))
            ORDER BY created_at DESC, id DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(visible_ids)
        .bind(search.as_deref())
        .bind(query.status())
        .bind(query.category())
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((staff, total))
    }
}
