pub mod user_repo;
pub use user_repo::{NewUser, UserRepository};
pub mod home_repo;
pub use home_repo::HomeRepository;
pub mod staff_repo;
pub use staff_repo::StaffRepository;
pub mod policy_repo;
pub use policy_repo::{NewPolicy, PolicyRepository};
pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod alert_repo;
pub use alert_repo::AlertRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
pub mod activity_repo;
pub use activity_repo::ActivityRepository;

#[cfg(test)]
pub(crate) mod seed;
