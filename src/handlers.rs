pub mod activity;
pub mod alerts;
pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod policy;
pub mod profile;
pub mod reports;
pub mod staff;
pub mod upload;
pub mod users;
