// src/models/staff.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const MAX_CERTIFICATES: usize = 3;
pub const MAX_EMPLOYMENT_RECORDS: usize = 3;

// ---
// Staff profile tracked for compliance (DBS, training)
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub home_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,

    pub dbs_check_status: String,
    pub dbs_expiry_date: Option<NaiveDate>,

    pub training_safeguarding_status: String,
    pub training_safeguarding_date: Option<NaiveDate>,
    pub training_first_aid_status: String,
    pub training_first_aid_date: Option<NaiveDate>,
    pub training_medication_status: String,
    pub training_medication_date: Option<NaiveDate>,

    pub training_certificates: Vec<String>,
    #[schema(value_type = Vec<EmploymentRecord>)]
    pub employment_history: Json<Vec<EmploymentRecord>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The three mandatory training courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingKind {
    Safeguarding,
    FirstAid,
    Medication,
}

impl TrainingKind {
    pub const ALL: [TrainingKind; 3] = [
        TrainingKind::Safeguarding,
        TrainingKind::FirstAid,
        TrainingKind::Medication,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TrainingKind::Safeguarding => "Safeguarding",
            TrainingKind::FirstAid => "First Aid",
            TrainingKind::Medication => "Medication",
        }
    }
}

impl Staff {
    pub fn training_status(&self, kind: TrainingKind) -> &str {
        match kind {
            TrainingKind::Safeguarding => &self.training_safeguarding_status,
            TrainingKind::FirstAid => &self.training_first_aid_status,
            TrainingKind::Medication => &self.training_medication_status,
        }
    }

    pub fn training_date(&self, kind: TrainingKind) -> Option<NaiveDate> {
        match kind {
            TrainingKind::Safeguarding => self.training_safeguarding_date,
            TrainingKind::FirstAid => self.training_first_aid_date,
            TrainingKind::Medication => self.training_medication_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentRecord {
    #[validate(length(min = 1, message = "Employer is required."))]
    pub employer: String,
    pub position: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "2021-03-01")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date, example = "2023-08-31")]
    pub end_date: Option<NaiveDate>,
}

// Embedded in policies and checklist items.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffBrief {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffPayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    #[validate(email(message = "A valid email is required."))]
    pub email: String,
    #[validate(length(min = 1, message = "Role is required."))]
    pub role: String,
    pub status: Option<String>,
    pub dbs_check_status: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub dbs_expiry_date: Option<NaiveDate>,
    pub training_safeguarding_status: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub training_safeguarding_date: Option<NaiveDate>,
    pub training_first_aid_status: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub training_first_aid_date: Option<NaiveDate>,
    pub training_medication_status: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub training_medication_date: Option<NaiveDate>,
}

impl CreateStaffPayload {
    /// The bare profile created alongside a staff login.
    pub fn for_login(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            role: "Staff".to_string(),
            status: None,
            dbs_check_status: None,
            dbs_expiry_date: None,
            training_safeguarding_status: None,
            training_safeguarding_date: None,
            training_first_aid_status: None,
            training_first_aid_date: None,
            training_medication_status: None,
            training_medication_date: None,
        }
    }
}

// Every field optional: provided fields are merged over the stored row.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffPayload {
    #[validate(length(min = 1, message = "Name cannot be empty."))]
    pub name: Option<String>,
    #[validate(email(message = "A valid email is required."))]
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub dbs_check_status: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub dbs_expiry_date: Option<NaiveDate>,
    pub training_safeguarding_status: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub training_safeguarding_date: Option<NaiveDate>,
    pub training_first_aid_status: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub training_first_aid_date: Option<NaiveDate>,
    pub training_medication_status: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub training_medication_date: Option<NaiveDate>,
}

// Documents the multipart body of POST /api/staff/{id}/update-records.
#[allow(dead_code)]
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct StaffRecordsForm {
    /// Up to 3 PDF/Word training certificates (field name `certificates`)
    #[schema(value_type = Vec<String>, format = Binary)]
    pub certificates: Vec<String>,
    /// JSON array of at most 3 employment records
    pub employment_history: Option<String>,
}

// ---
// Responses
// ---

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DbsCheckView {
    pub status: String,
    /// MM/DD/YYYY
    pub expiry_date: Option<String>,
    pub days_remaining: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrainingEntryView {
    /// YYYY-MM-DD
    pub date: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrainingView {
    pub safeguarding: TrainingEntryView,
    pub first_aid: TrainingEntryView,
    pub medication: TrainingEntryView,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffDetail {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub email: String,
    pub status: String,
    pub overall_compliance: u32,
    pub is_compliant: bool,
    pub dbs_check: DbsCheckView,
    pub training: TrainingView,
    pub training_certificates: Vec<String>,
    pub employment_history: Vec<EmploymentRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceSummary {
    pub overall_compliance: u32,
    pub fully_compliant: usize,
    pub attention_needed: usize,
    pub overdue: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffListResponse {
    pub data: Vec<Staff>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub summary: ComplianceSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StaffMessageResponse {
    pub message: String,
    pub staff: Staff,
}
