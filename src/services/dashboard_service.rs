// src/services/dashboard_service.rs

use crate::{
    common::error::AppError,
    db::{AlertRepository, AuditRepository, ReportRepository, StaffRepository},
    models::{
        audit::AuditChecklist,
        dashboard::{ChecklistCategoryOverview, DashboardOverview, OfstedVisit, RecentReport, CHECKLIST_CATEGORIES},
        report::Report,
    },
    services::{compliance, scope::Scope},
};

const RECENT_REPORTS: i64 = 3;
const OFSTED_REPORT_TYPE: &str = "ofsted";

#[derive(Clone)]
pub struct DashboardService {
    staff_repo: StaffRepository,
    audit_repo: AuditRepository,
    report_repo: ReportRepository,
    alert_repo: AlertRepository,
}

impl DashboardService {
    pub fn new(
        staff_repo: StaffRepository,
        audit_repo: AuditRepository,
        report_repo: ReportRepository,
        alert_repo: AlertRepository,
    ) -> Self {
        Self { staff_repo, audit_repo, report_repo, alert_repo }
    }

    /// Home-wide figures; callers pass `ScopeResolver::home_scope` for every role.
    pub async fn overview(&self, scope: &Scope) -> Result<DashboardOverview, AppError> {
        let staff = self.staff_repo.list_by_ids(&scope.staff_ids).await?;
        let items = self.audit_repo.list_for_home(scope.caller.home_id).await?;
        let last_ofsted = self
            .report_repo
            .latest_of_type(&scope.user_ids, OFSTED_REPORT_TYPE)
            .await?;
        let recent = self.report_repo.recent(&scope.user_ids, RECENT_REPORTS).await?;
        let active_alerts = self.alert_repo.count_active(&scope.staff_ids).await?;

        let completed = items.iter().filter(|i| is_complete(i)).count();

        Ok(DashboardOverview {
            overall_readiness: compliance::summarize(&staff).overall_compliance,
            audit_completion: compliance::readiness_percent(completed, items.len()),
            outstanding_actions: items.len() - completed,
            active_alerts,
            last_ofsted_visit: last_ofsted.map(|r| OfstedVisit {
                date: r.created_at.format("%Y-%m-%d").to_string(),
                rating: ofsted_rating(&r.status).to_string(),
            }),
            checklist_overview: checklist_overview(&items),
            recent_reports: recent.into_iter().map(recent_report).collect(),
        })
    }
}

fn is_complete(item: &AuditChecklist) -> bool {
    item.status.eq_ignore_ascii_case("complete")
}

pub fn ofsted_rating(status: &str) -> &'static str {
    match status {
        "complete" => "Outstanding",
        "in_progress" => "Good",
        "scheduled" => "Requires Improvement",
        _ => "Not Rated",
    }
}

pub fn checklist_overview(items: &[AuditChecklist]) -> Vec<ChecklistCategoryOverview> {
    CHECKLIST_CATEGORIES
        .iter()
        .map(|category| {
            let in_category: Vec<&AuditChecklist> = items
                .iter()
                .filter(|i| i.category.eq_ignore_ascii_case(category))
                .collect();
            ChecklistCategoryOverview {
                category: category.to_string(),
                completed: in_category.iter().filter(|i| is_complete(i)).count(),
                total: in_category.len(),
            }
        })
        .collect()
}

fn recent_report(report: Report) -> RecentReport {
    RecentReport {
        title: report.title,
        date: report.created_at.format("%Y-%m-%d").to_string(),
        status: report.status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn item(category: &str, status: &str) -> AuditChecklist {
        AuditChecklist {
            id: Uuid::new_v4(),
            home_id: Uuid::nil(),
            category: category.into(),
            item: "Check".into(),
            status: status.into(),
            priority: "medium".into(),
            due_date: None,
            assigned_to: None,
            evidence: Vec::new(),
            comments: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn rating_follows_report_status() {
        assert_eq!(ofsted_rating("complete"), "Outstanding");
        assert_eq!(ofsted_rating("in_progress"), "Good");
        assert_eq!(ofsted_rating("scheduled"), "Requires Improvement");
        assert_eq!(ofsted_rating("draft"), "Not Rated");
    }

    #[test]
    fn overview_lists_every_category_in_order() {
        let items = vec![
            item("Safeguarding", "complete"),
            item("Safeguarding", "pending"),
            item("Health and Safety", "complete"),
            item("Other", "complete"),
        ];

        let overview = checklist_overview(&items);
        assert_eq!(overview.len(), CHECKLIST_CATEGORIES.len());
        assert_eq!(
            overview[0],
            ChecklistCategoryOverview { category: "Safeguarding".into(), completed: 1, total: 2 }
        );
        assert_eq!(overview[1].total, 0);
        assert_eq!(overview[3].completed, 1);
    }

    #[sqlx::test]
    async fn staff_dashboard_covers_the_whole_home(pool: sqlx::PgPool) {
        use crate::{
            db::{seed, UserRepository},
            models::auth::UserRole,
            services::scope::ScopeResolver,
        };

        let home = seed::home(&pool, "Oak House").await;
        let carer = seed::user(&pool, home, "ada@oak.example", UserRole::Staff).await;
        seed::staff(&pool, home, Some(carer.id), "ada@oak.example").await;
        let colleague = seed::staff(&pool, home, None, "ben@oak.example").await;
        sqlx::query(
            r#"
            UPDATE staff SET
                dbs_check_status = 'valid',
                training_safeguarding_status = 'complete',
                training_first_aid_status = 'complete',
                training_medication_status = 'complete'
            WHERE id = $1
            "#,
        )
        .bind(colleague.id)
        .execute(&pool)
        .await
        .unwrap();

        let scope = ScopeResolver::new(
            UserRepository::new(pool.clone()),
            StaffRepository::new(pool.clone()),
            pool.clone(),
        )
        .home_scope(&seed::caller(&carer))
        .await
        .unwrap();

        let overview = DashboardService::new(
            StaffRepository::new(pool.clone()),
            AuditRepository::new(pool.clone()),
            ReportRepository::new(pool.clone()),
            AlertRepository::new(pool.clone()),
        )
        .overview(&scope)
        .await
        .unwrap();

        assert_eq!(overview.overall_readiness, 50);
        assert_eq!(overview.audit_completion, 0);
        assert_eq!(overview.outstanding_actions, 0);
        assert!(overview.last_ofsted_visit.is_none());
    }
}
