// src/models/report.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::UserBrief;

/// The report titles the dashboard knows how to produce.
pub const ALLOWED_REPORT_TITLES: [&str; 4] = [
    "OFSTED Readiness Report",
    "Staff Compliance Summary",
    "Audit Progress Report",
    "Policy Compliance Report",
];

pub const INITIAL_REPORT_STATUS: &str = "in_progress";

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub report_type: String,
    pub category: String,
    pub status: String,
    pub created_by: Uuid,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    #[serde(flatten)]
    pub report: Report,
    pub created_by_user: Option<UserBrief>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReportPayload {
    #[validate(length(min = 1, message = "Title is required."))]
    pub title: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Type is required."))]
    pub report_type: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateReportPayload {
    #[validate(length(min = 1, message = "Title cannot be empty."))]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

pub fn is_allowed_report_title(title: &str) -> bool {
    ALLOWED_REPORT_TITLES.contains(&title)
}
