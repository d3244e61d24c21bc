// src/services/report_service.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{ListQuery, Paginated},
    },
    db::{ReportRepository, UserRepository},
    models::{
        auth::{CallerContext, UserBrief},
        report::{is_allowed_report_title, CreateReportPayload, Report, ReportView, UpdateReportPayload},
    },
    services::scope::Scope,
};

#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    user_repo: UserRepository,
}

impl ReportService {
    pub fn new(report_repo: ReportRepository, user_repo: UserRepository) -> Self {
        Self { report_repo, user_repo }
    }

    async fn expand(&self, reports: Vec<Report>) -> Result<Vec<ReportView>, AppError> {
        let mut ids: Vec<Uuid> = reports.iter().map(|r| r.created_by).collect();
        ids.sort_unstable();
        ids.dedup();

        let authors: HashMap<Uuid, UserBrief> = self
            .user_repo
            .find_briefs(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(reports
            .into_iter()
            .map(|report| {
                let created_by_user = authors.get(&report.created_by).cloned();
                ReportView { report, created_by_user }
            })
            .collect())
    }

    /// Reports written by the visible users; staff see only their own.
    pub async fn list(&self, scope: &Scope, query: &ListQuery) -> Result<Paginated<ReportView>, AppError> {
        let window = query.window();
        let (reports, total) = self.report_repo.list_page(&scope.user_ids, query, window).await?;
        let views = self.expand(reports).await?;
        Ok(Paginated::new(views, total, window))
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<ReportView, AppError> {
        let report = self
            .report_repo
            .find_by_id(id)
            .await?
            .filter(|r| scope.can_see_user(r.created_by))
            .ok_or_else(|| AppError::not_found("Report"))?;

        let mut views = self.expand(vec![report]).await?;
        views.pop().ok_or_else(|| AppError::not_found("Report"))
    }

    pub async fn create(&self, caller: &CallerContext, payload: &CreateReportPayload) -> Result<Report, AppError> {
        if !is_allowed_report_title(&payload.title) {
            return Err(AppError::BadRequest("Invalid report title".into()));
        }
        self.report_repo
            .create_report(&payload.title, &payload.report_type, &payload.title, caller.id)
            .await
    }

    async fn find_owned(&self, caller: &CallerContext, id: Uuid) -> Result<Report, AppError> {
        self.report_repo
            .find_owned(id, caller.id)
            .await?
            .ok_or_else(|| AppError::not_found("Report"))
    }

    pub async fn update(
        &self,
        caller: &CallerContext,
        id: Uuid,
        payload: &UpdateReportPayload,
    ) -> Result<Report, AppError> {
        self.find_owned(caller, id).await?;
        if let Some(title) = payload.title.as_deref() {
            if !is_allowed_report_title(title) {
                return Err(AppError::BadRequest("Invalid report title".into()));
            }
        }
        self.report_repo.update_report(id, payload).await
    }

    pub async fn delete(&self, caller: &CallerContext, id: Uuid) -> Result<(), AppError> {
        self.find_owned(caller, id).await?;
        self.report_repo.delete_report(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::report::{is_allowed_report_title, ALLOWED_REPORT_TITLES};

    #[test]
    fn only_known_titles_are_allowed() {
        for title in ALLOWED_REPORT_TITLES {
            assert!(is_allowed_report_title(title));
        }
        assert!(!is_allowed_report_title("Quarterly Banter"));
        assert!(!is_allowed_report_title("ofsted readiness report"));
    }
}
