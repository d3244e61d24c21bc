// src/models/dashboard.rs

use serde::Serialize;
use utoipa::ToSchema;

// Audit categories shown on the dashboard, in display order.
pub const CHECKLIST_CATEGORIES: [&str; 5] = [
    "Safeguarding",
    "Behavior Management",
    "Staff Recruitment",
    "Health and Safety",
    "Leadership and Management",
];

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    /// Percentage of staff fully compliant
    pub overall_readiness: u32,
    /// Percentage of checklist items complete
    pub audit_completion: u32,
    pub outstanding_actions: usize,
    pub active_alerts: i64,
    pub last_ofsted_visit: Option<OfstedVisit>,
    pub checklist_overview: Vec<ChecklistCategoryOverview>,
    pub recent_reports: Vec<RecentReport>,
}

#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct ChecklistCategoryOverview {
    pub category: String,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OfstedVisit {
    /// YYYY-MM-DD
    pub date: String,
    pub rating: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecentReport {
    pub title: String,
    /// YYYY-MM-DD
    pub date: String,
    pub status: String,
}
