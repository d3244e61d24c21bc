pub mod activity_service;
pub mod alert_rules;
pub mod alert_service;
pub mod audit_service;
pub mod auth;
pub mod compliance;
pub mod dashboard_service;
pub mod document_service;
pub mod policy_service;
pub mod report_service;
pub mod scope;
pub mod staff_service;
pub mod user_service;
