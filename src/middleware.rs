pub mod activity;
pub mod auth;
pub mod rbac;
