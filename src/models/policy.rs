// src/models/policy.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::staff::StaffBrief;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: Uuid,
    pub home_id: Uuid,
    pub title: String,
    pub category: String,
    pub version: String,
    pub status: String,
    /// Stored filename under the policies document folder
    pub document: String,
    pub assigned_staff: Vec<Uuid>,
    pub acknowledged_staff: Vec<Uuid>,
    pub acknowledgements: i32,
    pub last_updated: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Policy {
    pub fn is_assigned_to(&self, staff_id: Uuid) -> bool {
        self.assigned_staff.contains(&staff_id)
    }

    pub fn is_acknowledged_by(&self, staff_id: Uuid) -> bool {
        self.acknowledged_staff.contains(&staff_id)
    }
}

// A policy with its assigned staff expanded.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyView {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub version: String,
    pub status: String,
    pub document: String,
    pub assigned_staff: Vec<StaffBrief>,
    pub acknowledged_staff: Vec<Uuid>,
    pub acknowledgements: i32,
    pub last_updated: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl PolicyView {
    pub fn new(policy: Policy, assigned_staff: Vec<StaffBrief>) -> Self {
        Self {
            id: policy.id,
            title: policy.title,
            category: policy.category,
            version: policy.version,
            status: policy.status,
            document: policy.document,
            assigned_staff,
            acknowledged_staff: policy.acknowledged_staff,
            acknowledgements: policy.acknowledgements,
            last_updated: policy.last_updated,
            created_at: policy.created_at,
        }
    }
}

/// Parsed text fields of a policy multipart form.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PolicyFields {
    pub title: Option<String>,
    pub category: Option<String>,
    pub version: Option<String>,
    pub review_date: Option<NaiveDate>,
    pub priority: Option<String>,
    pub assigned_staff: Option<Vec<Uuid>>,
}

// Documents the multipart body of POST/PUT /api/policy.
#[allow(dead_code)]
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct PolicyUploadForm {
    pub title: String,
    pub category: String,
    pub version: String,
    /// YYYY-MM-DD
    pub review_date: String,
    pub priority: String,
    /// Repeat the field once per staff id
    pub assigned_staff: Vec<Uuid>,
    /// PDF or Word document, 5MB max
    #[schema(value_type = String, format = Binary)]
    pub document: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PolicyMessageResponse {
    pub message: String,
    pub policy: Policy,
}
