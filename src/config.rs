// src/config.rs

use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        ActivityRepository, AlertRepository, AuditRepository, HomeRepository, PolicyRepository,
        ReportRepository, StaffRepository, UserRepository,
    },
    jobs::alert_generator::{AlertGenerator, PgSweepStore},
    services::{
        activity_service::ActivityService,
        alert_service::AlertService,
        audit_service::AuditService,
        auth::{AuthService, JwtKeys},
        dashboard_service::DashboardService,
        document_service::DocumentService,
        policy_service::PolicyService,
        report_service::ReportService,
        scope::ScopeResolver,
        staff_service::StaffService,
        user_service::UserService,
    },
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub jwt_expiry_minutes: i64,
    pub documents_dir: PathBuf,
    pub alert_sweep_interval: Duration,
    pub alert_sweep_enabled: bool,
    pub cors_origin: Option<String>,
    pub invite_default_password: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: or_default("BIND_ADDR", "0.0.0.0:5000"),
            db_max_connections: or_default("DB_MAX_CONNECTIONS", "5")
                .parse()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            db_acquire_timeout: Duration::from_secs(
                or_default("DB_ACQUIRE_TIMEOUT_SECS", "3")
                    .parse()
                    .context("DB_ACQUIRE_TIMEOUT_SECS must be a number of seconds")?,
            ),
            jwt_expiry_minutes: or_default("JWT_EXPIRY_MINUTES", "60")
                .parse()
                .context("JWT_EXPIRY_MINUTES must be a number of minutes")?,
            documents_dir: PathBuf::from(or_default("DOCUMENTS_DIR", "./documents")),
            alert_sweep_interval: Duration::from_secs(
                or_default("ALERT_SWEEP_INTERVAL_SECS", "3600")
                    .parse::<u64>()
                    .context("ALERT_SWEEP_INTERVAL_SECS must be a number of seconds")?
                    .max(1),
            ),
            alert_sweep_enabled: or_default("ALERT_SWEEP_ENABLED", "true")
                .parse()
                .context("ALERT_SWEEP_ENABLED must be true or false")?,
            cors_origin: lookup("CORS_ORIGIN").filter(|v| !v.trim().is_empty()),
            invite_default_password: or_default("INVITE_DEFAULT_PASSWORD", "User@123"),
        })
    }
}

// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db_pool: PgPool,
    pub jwt: JwtKeys,
    pub scope_resolver: ScopeResolver,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub staff_service: StaffService,
    pub policy_service: PolicyService,
    pub audit_service: AuditService,
    pub report_service: ReportService,
    pub alert_service: AlertService,
    pub activity_service: ActivityService,
    pub dashboard_service: DashboardService,
    pub documents: DocumentService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("failed to connect to the database")?;

        tracing::info!("Database connection established");
        Ok(Self::with_pool(config, db_pool))
    }

    /// Wires repositories and services around an existing pool.
    pub fn with_pool(config: Config, db_pool: PgPool) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let staff_repo = StaffRepository::new(db_pool.clone());
        let policy_repo = PolicyRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());
        let alert_repo = AlertRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());
        let activity_repo = ActivityRepository::new(db_pool.clone());

        let jwt = JwtKeys::new(&config.jwt_secret, config.jwt_expiry_minutes);
        let documents = DocumentService::new(config.documents_dir.clone());

        Self {
            scope_resolver: ScopeResolver::new(user_repo.clone(), staff_repo.clone(), db_pool.clone()),
            auth_service: AuthService::new(
                user_repo.clone(),
                staff_repo.clone(),
                HomeRepository::new(),
                jwt.clone(),
                db_pool.clone(),
            ),
            user_service: UserService::new(
                user_repo.clone(),
                staff_repo.clone(),
                config.invite_default_password.clone(),
                db_pool.clone(),
            ),
            staff_service: StaffService::new(
                staff_repo.clone(),
                user_repo.clone(),
                documents.clone(),
                db_pool.clone(),
            ),
            policy_service: PolicyService::new(
                policy_repo,
                staff_repo.clone(),
                documents.clone(),
                db_pool.clone(),
            ),
            audit_service: AuditService::new(audit_repo.clone(), staff_repo.clone(), documents.clone()),
            report_service: ReportService::new(report_repo.clone(), user_repo.clone()),
            alert_service: AlertService::new(alert_repo.clone()),
            activity_service: ActivityService::new(activity_repo, user_repo, db_pool.clone()),
            dashboard_service: DashboardService::new(staff_repo, audit_repo, report_repo, alert_repo),
            documents,
            jwt,
            db_pool,
            config,
        }
    }

    pub fn alert_generator(&self) -> AlertGenerator<PgSweepStore> {
        AlertGenerator::new(PgSweepStore::new(
            StaffRepository::new(self.db_pool.clone()),
            PolicyRepository::new(self.db_pool.clone()),
            AlertRepository::new(self.db_pool.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_fill_optional_settings() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/care"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.jwt_expiry_minutes, 60);
        assert_eq!(config.documents_dir, PathBuf::from("./documents"));
        assert_eq!(config.alert_sweep_interval, Duration::from_secs(3600));
        assert!(config.alert_sweep_enabled);
        assert_eq!(config.cors_origin, None);
        assert_eq!(config.invite_default_password, "User@123");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/care")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/care"),
            ("JWT_SECRET", "s3cret"),
            ("ALERT_SWEEP_INTERVAL_SECS", "60"),
            ("ALERT_SWEEP_ENABLED", "false"),
            ("CORS_ORIGIN", "http://localhost:3000"),
        ]))
        .unwrap();

        assert_eq!(config.alert_sweep_interval, Duration::from_secs(60));
        assert!(!config.alert_sweep_enabled);
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/care"),
            ("JWT_SECRET", "s3cret"),
            ("DB_MAX_CONNECTIONS", "lots"),
        ]));
        assert!(result.is_err());
    }
}
