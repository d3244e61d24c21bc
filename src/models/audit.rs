// src/models/audit.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::staff::StaffBrief;

pub const MAX_EVIDENCE_FILES: usize = 3;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditChecklist {
    pub id: Uuid,
    pub home_id: Uuid,
    pub category: String,
    pub item: String,
    pub status: String,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
    pub evidence: Vec<String>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditChecklistView {
    pub id: Uuid,
    pub category: String,
    pub item: String,
    pub status: String,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<StaffBrief>,
    pub evidence: Vec<String>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditChecklistView {
    pub fn new(item: AuditChecklist, assigned_to: Option<StaffBrief>) -> Self {
        Self {
            id: item.id,
            category: item.category,
            item: item.item,
            status: item.status,
            priority: item.priority,
            due_date: item.due_date,
            assigned_to,
            evidence: item.evidence,
            comments: item.comments,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuditChecklistPayload {
    #[validate(length(min = 1, message = "Category is required."))]
    pub category: String,
    #[validate(length(min = 1, message = "Item is required."))]
    pub item: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
    pub comments: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuditChecklistPayload {
    #[validate(length(min = 1, message = "Category cannot be empty."))]
    pub category: Option<String>,
    #[validate(length(min = 1, message = "Item cannot be empty."))]
    pub item: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
    pub comments: Option<String>,
}

// Documents the multipart body of POST /api/audit-checklist/{id}/evidence.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct EvidenceUploadForm {
    /// Up to 3 PDF/Word files (field name `evidence`), 5MB each
    #[schema(value_type = Vec<String>, format = Binary)]
    pub evidence: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditMessageResponse {
    pub message: String,
    pub data: AuditChecklist,
}
