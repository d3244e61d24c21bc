// src/jobs/alert_generator.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::{task::JoinHandle, time::interval};

use crate::{
    common::error::AppError,
    db::{AlertRepository, PolicyRepository, StaffRepository},
    models::{alert::AlertDraft, policy::Policy, staff::Staff},
    services::alert_rules,
};

/// What the sweep reads and writes.
#[async_trait]
pub trait SweepStore: Send + Sync {
    async fn load_staff(&self) -> Result<Vec<Staff>, AppError>;
    async fn load_policies(&self) -> Result<Vec<Policy>, AppError>;
    /// `true` when a row was inserted, `false` when an active twin already exists.
    async fn insert_if_absent(&self, draft: &AlertDraft, at: DateTime<Utc>) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgSweepStore {
    staff_repo: StaffRepository,
    policy_repo: PolicyRepository,
    alert_repo: AlertRepository,
}

impl PgSweepStore {
    pub fn new(staff_repo: StaffRepository, policy_repo: PolicyRepository, alert_repo: AlertRepository) -> Self {
        Self { staff_repo, policy_repo, alert_repo }
    }
}

#[async_trait]
impl SweepStore for PgSweepStore {
    async fn load_staff(&self) -> Result<Vec<Staff>, AppError> {
        self.staff_repo.list_all().await
    }

    async fn load_policies(&self) -> Result<Vec<Policy>, AppError> {
        self.policy_repo.list_all().await
    }

    async fn insert_if_absent(&self, draft: &AlertDraft, at: DateTime<Utc>) -> Result<bool, AppError> {
        self.alert_repo.insert_if_absent(draft, at).await
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub staff_evaluated: usize,
    pub candidates: usize,
    pub created: usize,
    pub failed: usize,
}

pub struct AlertGenerator<S> {
    store: S,
}

impl<S: SweepStore> AlertGenerator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// One pass over every staff record. A failed insert is logged and skipped.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, AppError> {
        let staff = self.store.load_staff().await?;
        let policies = self.store.load_policies().await?;

        let mut report = SweepReport::default();
        for member in &staff {
            report.staff_evaluated += 1;

            for draft in alert_rules::evaluate_staff(member, &policies, now) {
                report.candidates += 1;
                match self.store.insert_if_absent(&draft, now).await {
                    Ok(true) => report.created += 1,
                    Ok(false) => {}
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(
                            staff_id = %draft.staff_id,
                            title = %draft.title,
                            error = %e,
                            "Alert insert failed"
                        );
                    }
                }
            }
        }
        Ok(report)
    }
}

/// Runs the sweep immediately and then every `every` until the handle is aborted.
pub fn spawn_alert_generator<S>(generator: AlertGenerator<S>, every: Duration) -> JoinHandle<()>
where
    S: SweepStore + 'static,
{
    tracing::info!(interval_secs = every.as_secs(), "Starting alert generator");

    tokio::spawn(async move {
        let mut tick = interval(every);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick.tick().await;
            match generator.sweep(Utc::now()).await {
                Ok(report) => tracing::info!(
                    staff_evaluated = report.staff_evaluated,
                    candidates = report.candidates,
                    created = report.created,
                    failed = report.failed,
                    "Alert sweep finished"
                ),
                Err(e) => tracing::error!(error = %e, "Alert sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::alert::AlertSeverity,
        services::{
            alert_rules::fixtures::{assigned, policy},
            compliance::fixtures::compliant,
        },
    };
    use chrono::{NaiveDate, TimeZone};
    use std::sync::Mutex;
    use uuid::Uuid;

    // Mirrors the partial unique index: one active alert per (staff, title).
    #[derive(Default)]
    struct MemoryStore {
        staff: Vec<Staff>,
        policies: Vec<Policy>,
        alerts: Mutex<Vec<AlertDraft>>,
        fail_titles: Vec<String>,
    }

    #[async_trait]
    impl SweepStore for MemoryStore {
        async fn load_staff(&self) -> Result<Vec<Staff>, AppError> {
            Ok(self.staff.clone())
        }

        async fn load_policies(&self) -> Result<Vec<Policy>, AppError> {
            Ok(self.policies.clone())
        }

        async fn insert_if_absent(&self, draft: &AlertDraft, _at: DateTime<Utc>) -> Result<bool, AppError> {
            if self.fail_titles.contains(&draft.title) {
                return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
            }
            let mut alerts = self.alerts.lock().unwrap();
            if alerts
                .iter()
                .any(|a| a.staff_id == draft.staff_id && a.title == draft.title)
            {
                return Ok(false);
            }
            alerts.push(draft.clone());
            Ok(true)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 9, 0, 0).unwrap()
    }

    fn overdue_staff() -> Staff {
        let mut s = compliant("Ada");
        s.training_safeguarding_date = NaiveDate::from_ymd_opt(2030, 5, 1);
        s
    }

    #[tokio::test]
    async fn overdue_training_alerts_once_across_sweeps() {
        let store = MemoryStore {
            staff: vec![overdue_staff()],
            ..Default::default()
        };
        let generator = AlertGenerator::new(store);

        let first = generator.sweep(now()).await.unwrap();
        assert_eq!(
            first,
            SweepReport { staff_evaluated: 1, candidates: 1, created: 1, failed: 0 }
        );

        let second = generator.sweep(now()).await.unwrap();
        assert_eq!(second.candidates, 1);
        assert_eq!(second.created, 0);

        let alerts = generator.store.alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "Safeguarding Training Overdue");
        assert_eq!(alerts[0].severity, AlertSeverity::Danger);
    }

    #[tokio::test]
    async fn failed_insert_does_not_stop_the_sweep() {
        let mut other = compliant("Ben");
        other.dbs_check_status = "warning".into();

        let store = MemoryStore {
            staff: vec![overdue_staff(), other],
            fail_titles: vec!["Safeguarding Training Overdue".into()],
            ..Default::default()
        };
        let generator = AlertGenerator::new(store);

        let report = generator.sweep(now()).await.unwrap();
        assert_eq!(report.staff_evaluated, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.created, 1);
    }

    #[tokio::test]
    async fn sweep_leaves_records_untouched_and_raises_policy_alerts() {
        let s = compliant("Cy");
        let p = assigned(policy(s.home_id, "Lone Working", NaiveDate::from_ymd_opt(2030, 5, 31).unwrap()), &s);
        let foreign = assigned(policy(Uuid::new_v4(), "Elsewhere", NaiveDate::from_ymd_opt(2030, 5, 31).unwrap()), &s);

        let store = MemoryStore {
            staff: vec![s.clone()],
            policies: vec![p, foreign],
            ..Default::default()
        };
        let generator = AlertGenerator::new(store);

        let report = generator.sweep(now()).await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(generator.store.staff[0].training_safeguarding_status, s.training_safeguarding_status);

        let alerts = generator.store.alerts.lock().unwrap();
        assert_eq!(alerts[0].title, "Policy Acknowledgement Required: Lone Working");
        assert_eq!(alerts[0].severity, AlertSeverity::Info);
    }
}
