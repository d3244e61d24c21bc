// src/models/alert.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::pagination::{like_pattern, non_empty, PageWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "alert_severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "alert_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Dismissed,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub category: String,
    pub status: AlertStatus,
    pub date: DateTime<Utc>,
}

/// An alert the sweep wants to exist; inserted only if no active twin exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDraft {
    pub staff_id: Uuid,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub category: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: AlertSeverity,
    pub title: String,
    pub description: String,
    /// YYYY-MM-DD
    pub date: String,
    pub category: String,
    pub urgent: bool,
    pub staff_id: Uuid,
    pub status: AlertStatus,
}

impl From<Alert> for AlertView {
    fn from(alert: Alert) -> Self {
        Self {
            id: alert.id,
            kind: alert.severity,
            urgent: alert.severity == AlertSeverity::Danger,
            title: alert.title,
            description: alert.description,
            date: alert.date.format("%Y-%m-%d").to_string(),
            category: alert.category,
            staff_id: alert.staff_id,
            status: alert.status,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlertListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Matches title or description
    pub search: Option<String>,
    pub category: Option<String>,
    /// Defaults to `active`
    pub status: Option<AlertStatus>,
    pub severity: Option<AlertSeverity>,
}

impl AlertListQuery {
    pub fn window(&self) -> PageWindow {
        PageWindow::new(self.page, self.limit)
    }

    pub fn search_pattern(&self) -> Option<String> {
        like_pattern(self.search.as_deref())
    }

    pub fn category(&self) -> Option<&str> {
        non_empty(self.category.as_deref())
    }

    pub fn status(&self) -> AlertStatus {
        self.status.unwrap_or(AlertStatus::Active)
    }
}
