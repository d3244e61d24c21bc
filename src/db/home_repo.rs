// src/db/home_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::home::Home};

#[derive(Clone, Default)]
pub struct HomeRepository;

impl HomeRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_home<'e, E>(&self, executor: E, name: &str) -> Result<Home, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let home = sqlx::query_as::<_, Home>("INSERT INTO homes (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(executor)
            .await?;
        Ok(home)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Home>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let home = sqlx::query_as::<_, Home>("SELECT * FROM homes WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(home)
    }
}
