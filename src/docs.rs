// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::invite_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- Profile ---
        handlers::profile::get_profile,
        handlers::profile::update_profile,
        handlers::profile::change_password,

        // --- Staff ---
        handlers::staff::list_staff,
        handlers::staff::get_staff,
        handlers::staff::create_staff,
        handlers::staff::update_staff,
        handlers::staff::delete_staff,
        handlers::staff::update_staff_records,

        // --- Policies ---
        handlers::policy::list_policies,
        handlers::policy::get_policy,
        handlers::policy::create_policy,
        handlers::policy::update_policy,
        handlers::policy::delete_policy,
        handlers::policy::acknowledge_policy,

        // --- Audit checklist ---
        handlers::audit::list_checklist,
        handlers::audit::get_checklist_item,
        handlers::audit::create_checklist_item,
        handlers::audit::update_checklist_item,
        handlers::audit::delete_checklist_item,
        handlers::audit::upload_evidence,

        // --- Reports ---
        handlers::reports::list_reports,
        handlers::reports::get_report,
        handlers::reports::create_report,
        handlers::reports::update_report,
        handlers::reports::delete_report,

        // --- Dashboard ---
        handlers::dashboard::get_overview,

        // --- Alerts ---
        handlers::alerts::list_alerts,
        handlers::alerts::get_alert,
        handlers::alerts::dismiss_alert,

        // --- Activity ---
        handlers::activity::list_activity_logs,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::UserStatus,
            models::auth::User,
            models::auth::UserBrief,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::RegisterResponse,

            // --- Users / Profile ---
            models::user::InviteUserPayload,
            models::user::UpdateUserPayload,
            models::user::UserMessageResponse,
            models::user::MessageResponse,
            models::user::ProfileResponse,
            models::user::UpdateProfilePayload,
            models::user::ChangePasswordPayload,

            // --- Homes ---
            models::home::Home,

            // --- Staff ---
            models::staff::Staff,
            models::staff::StaffBrief,
            models::staff::EmploymentRecord,
            models::staff::CreateStaffPayload,
            models::staff::UpdateStaffPayload,
            models::staff::StaffRecordsForm,
            models::staff::DbsCheckView,
            models::staff::TrainingEntryView,
            models::staff::TrainingView,
            models::staff::StaffDetail,
            models::staff::ComplianceSummary,
            models::staff::StaffListResponse,
            models::staff::StaffMessageResponse,

            // --- Policies ---
            models::policy::Policy,
            models::policy::PolicyView,
            models::policy::PolicyUploadForm,
            models::policy::PolicyMessageResponse,

            // --- Audit checklist ---
            models::audit::AuditChecklist,
            models::audit::AuditChecklistView,
            models::audit::CreateAuditChecklistPayload,
            models::audit::UpdateAuditChecklistPayload,
            models::audit::EvidenceUploadForm,
            models::audit::AuditMessageResponse,

            // --- Reports ---
            models::report::Report,
            models::report::ReportView,
            models::report::CreateReportPayload,
            models::report::UpdateReportPayload,

            // --- Dashboard ---
            models::dashboard::DashboardOverview,
            models::dashboard::ChecklistCategoryOverview,
            models::dashboard::OfstedVisit,
            models::dashboard::RecentReport,

            // --- Alerts ---
            models::alert::AlertSeverity,
            models::alert::AlertStatus,
            models::alert::AlertView,

            // --- Activity ---
            models::activity::ActivityLogView,
        )
    ),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "User management for admins"),
        (name = "Profile", description = "The caller's own account"),
        (name = "Staff", description = "Staff records, training and DBS checks"),
        (name = "Policies", description = "Policy documents and acknowledgements"),
        (name = "Audit Checklist", description = "Inspection checklist items and evidence"),
        (name = "Reports", description = "Compliance reports"),
        (name = "Dashboard", description = "Inspection readiness overview"),
        (name = "Alerts", description = "Alerts raised by the compliance sweep"),
        (name = "Activity", description = "Audit trail of write requests")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route_with_bearer_security() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/auth/register",
            "/api/staff/{id}/update-records",
            "/api/policy/{policyId}/acknowledge",
            "/api/audit-checklist/{id}/evidence",
            "/api/alerts/{id}",
            "/api/activity-logs",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
