// src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub action: String,
    pub category: String,
    pub details: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivityLog {
    pub user_id: Uuid,
    pub user_name: String,
    pub action: String,
    pub category: String,
    pub details: String,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityLogView {
    pub id: Uuid,
    /// YYYY-MM-DD HH:MM
    pub timestamp: String,
    pub user: String,
    pub category: String,
    pub action: String,
    pub details: String,
    pub status: String,
}

impl From<ActivityLog> for ActivityLogView {
    fn from(log: ActivityLog) -> Self {
        Self {
            id: log.id,
            timestamp: log.created_at.format("%Y-%m-%d %H:%M").to_string(),
            user: log.user_name,
            category: log.category.to_uppercase(),
            action: log.action,
            details: log.details,
            status: log.status.to_uppercase(),
        }
    }
}
