// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError, pagination::PageWindow},
    models::{
        auth::{User, UserBrief, UserRole, UserStatus},
        user::UserListQuery,
    },
};

pub struct NewUser<'a> {
    pub home_id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: UserRole,
    pub status: UserStatus,
}

// Every interaction with the `users` table.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email<'e, E>(&self, executor: E, email: &str) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn create_user<'e, E>(&self, executor: E, new_user: NewUser<'_>) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (home_id, name, email, password_hash, role, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new_user.home_id)
        .bind(new_user.name)
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.role)
        .bind(new_user.status)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Email already exists"))
    }

    /// True when another user (not `id`) already owns `email`.
    pub async fn email_taken_by_other<'e, E>(
        &self,
        executor: E,
        email: &str,
        id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND id <> $2)",
        )
        .bind(email)
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(taken)
    }

    pub async fn update_user<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
        role: Option<UserRole>,
        status: Option<UserStatus>,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                status = COALESCE($5, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(status)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Email already in use by another user"))
    }

    pub async fn update_password<'e, E>(&self, executor: E, id: Uuid, password_hash: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Stamps `last_login`; an invited (inactive) account becomes active on first login.
    pub async fn record_login<'e, E>(&self, executor: E, id: Uuid) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET last_login = NOW(), status = 'active', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(user)
    }

    pub async fn delete_user<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_ids_by_home(&self, home_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE home_id = $1")
            .bind(home_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    pub async fn find_briefs(&self, ids: &[Uuid]) -> Result<Vec<UserBrief>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = sqlx::query_as::<_, UserBrief>(
            "SELECT id, name, email, role FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// One page of the visible users, newest first, plus the filtered total.
    pub async fn list_page(
        &self,
        visible_ids: &[Uuid],
        query: &UserListQuery,
        window: PageWindow,
    ) -> Result<(Vec<User>, i64), AppError> {
        let search = query.search_pattern();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE id = ANY($1)
              AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2)
              AND ($3::user_role IS NULL OR role = $3)
              AND ($4::user_status IS NULL OR status = $4)
            "#,
        )
        .bind(visible_ids)
        .bind(search.as_deref())
        .bind(query.role)
        .bind(query.status)
        .fetch_one(&self.pool)
        .await?;

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE id = ANY($1)
              AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2)
              AND ($3::user_role IS NULL OR role = $3)
              AND ($4::user_status IS NULL OR status = $4)
            ORDER BY created_at DESC, id DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(visible_ids)
        .bind(search.as_deref())
        .bind(query.role)
        .bind(query.status)
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed;

    #[sqlx::test]
    async fn second_page_holds_rows_six_to_ten_newest_first(pool: PgPool) {
        let home = seed::home(&pool, "Oak House").await;
        let mut ids = Vec::new();
        for i in 0..12 {
            let user = seed::user(&pool, home, &format!("user{i}@oak.example"), UserRole::Staff).await;
            // user0 is the oldest, user11 the newest.
            sqlx::query("UPDATE users SET created_at = NOW() - make_interval(mins => $2) WHERE id = $1")
                .bind(user.id)
                .bind(100 - i)
                .execute(&pool)
                .await
                .unwrap();
            ids.push(user.id);
        }

        let repo = UserRepository::new(pool.clone());
        let query = UserListQuery { page: Some(2), limit: Some(5), ..Default::default() };
        let (users, total) = repo.list_page(&ids, &query, query.window()).await.unwrap();

        assert_eq!(total, 12);
        let emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(
            emails,
            vec![
                "user6@oak.example",
                "user5@oak.example",
                "user4@oak.example",
                "user3@oak.example",
                "user2@oak.example",
            ]
        );
    }

    #[sqlx::test]
    async fn page_far_past_the_end_is_empty(pool: PgPool) {
        let home = seed::home(&pool, "Oak House").await;
        let user = seed::user(&pool, home, "only@oak.example", UserRole::Admin).await;

        let repo = UserRepository::new(pool.clone());
        let query = UserListQuery { page: Some(i64::MAX), limit: Some(100), ..Default::default() };
        let (users, total) = repo.list_page(&[user.id], &query, query.window()).await.unwrap();

        assert!(users.is_empty());
        assert_eq!(total, 1);
    }
}
