// src/models/home.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// A tenant: one childcare provider. Its id is also the code staff register with.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
