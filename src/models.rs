pub mod activity;
pub mod alert;
pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod home;
pub mod policy;
pub mod report;
pub mod staff;
pub mod user;
