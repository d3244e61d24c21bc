// src/services/staff_service.rs

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, pagination::ListQuery},
    db::{StaffRepository, UserRepository},
    models::{
        auth::CallerContext,
        staff::{
            CreateStaffPayload, DbsCheckView, EmploymentRecord, Staff, StaffDetail, StaffListResponse,
            TrainingEntryView, TrainingKind, TrainingView, UpdateStaffPayload, MAX_CERTIFICATES,
            MAX_EMPLOYMENT_RECORDS,
        },
    },
    services::{
        compliance,
        document_service::{DocumentKind, DocumentService, UploadedFile},
        scope::Scope,
    },
};

#[derive(Clone)]
pub struct StaffService {
    staff_repo: StaffRepository,
    user_repo: UserRepository,
    documents: DocumentService,
    pool: PgPool,
}

impl StaffService {
    pub fn new(
        staff_repo: StaffRepository,
        user_repo: UserRepository,
        documents: DocumentService,
        pool: PgPool,
    ) -> Self {
        Self { staff_repo, user_repo, documents, pool }
    }

    /// A page of visible staff plus the compliance summary over all of them.
    pub async fn list(&self, scope: &Scope, query: &ListQuery) -> Result<StaffListResponse, AppError> {
        let window = query.window();
        let (data, total) = self.staff_repo.list_page(&scope.staff_ids, query, window).await?;
        let everyone = self.staff_repo.list_by_ids(&scope.staff_ids).await?;

        Ok(StaffListResponse {
            data,
            total,
            page: window.page,
            limit: window.limit,
            total_pages: window.total_pages(total),
            summary: compliance::summarize(&everyone),
        })
    }

    async fn find_visible(&self, scope: &Scope, id: Uuid) -> Result<Staff, AppError> {
        if !scope.can_see_staff(id) {
            return Err(AppError::not_found("Staff"));
        }
        self.staff_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Staff"))
    }

    pub async fn detail(&self, scope: &Scope, id: Uuid) -> Result<StaffDetail, AppError> {
        let staff = self.find_visible(scope, id).await?;
        Ok(staff_detail(staff, Utc::now().date_naive()))
    }

    /// New staff join the admin's home and are linked to a login with the same email there.
    pub async fn create(&self, caller: &CallerContext, payload: &CreateStaffPayload) -> Result<Staff, AppError> {
        let user_id = self
            .user_repo
            .find_by_email(&self.pool, &payload.email)
            .await?
            .filter(|u| u.home_id == caller.home_id)
            .map(|u| u.id);

        let staff = self
            .staff_repo
            .create_staff(&self.pool, caller.home_id, user_id, payload)
            .await?;

        tracing::info!(staff_id = %staff.id, linked = user_id.is_some(), "Staff created");
        Ok(staff)
    }

    pub async fn update(&self, scope: &Scope, id: Uuid, payload: &UpdateStaffPayload) -> Result<Staff, AppError> {
        self.find_visible(scope, id).await?;
        self.staff_repo.update_staff(&self.pool, id, payload).await
    }

    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), AppError> {
        self.find_visible(scope, id).await?;
        self.staff_repo.delete_staff(&self.pool, id).await?;
        Ok(())
    }

    /// Replaces the training certificates (when files are sent) and/or the employment
    /// history (when the JSON field is sent). Old certificate files are unlinked only
    /// after the row is saved.
    pub async fn update_records(
        &self,
        scope: &Scope,
        id: Uuid,
        certificates: &[UploadedFile],
        employment_history: Option<&str>,
    ) -> Result<Staff, AppError> {
        let existing = self.find_visible(scope, id).await?;
        let history = employment_history.map(parse_employment_history).transpose()?;

        if certificates.is_empty() && history.is_none() {
            return Err(AppError::BadRequest(
                "Nothing to update: send certificates or employmentHistory".into(),
            ));
        }

        let stored = if certificates.is_empty() {
            None
        } else {
            Some(
                self.documents
                    .save_all(DocumentKind::Certificates, certificates, MAX_CERTIFICATES)
                    .await?,
            )
        };

        let updated = match self
            .staff_repo
            .update_records(id, stored.as_deref(), history.as_deref())
            .await
        {
            Ok(staff) => staff,
            Err(e) => {
                if let Some(names) = &stored {
                    self.documents.report_orphans(DocumentKind::Certificates, names, &e);
                }
                return Err(e);
            }
        };

        if stored.is_some() {
            self.documents
                .remove_best_effort(DocumentKind::Certificates, &existing.training_certificates)
                .await;
        }

        Ok(updated)
    }
}

pub fn parse_employment_history(raw: &str) -> Result<Vec<EmploymentRecord>, AppError> {
    let records: Vec<EmploymentRecord> = serde_json::from_str(raw)
        .map_err(|e| AppError::BadRequest(format!("Invalid employmentHistory: {e}")))?;

    if records.len() > MAX_EMPLOYMENT_RECORDS {
        return Err(AppError::BadRequest(format!(
            "At most {MAX_EMPLOYMENT_RECORDS} employment records are allowed"
        )));
    }
    for record in &records {
        record.validate()?;
    }
    Ok(records)
}

fn training_entry(staff: &Staff, kind: TrainingKind) -> TrainingEntryView {
    TrainingEntryView {
        date: staff.training_date(kind).map(|d| d.format("%Y-%m-%d").to_string()),
        status: staff.training_status(kind).to_string(),
    }
}

pub fn staff_detail(staff: Staff, today: NaiveDate) -> StaffDetail {
    let overall_compliance = compliance::overall_compliance(&staff);
    let is_compliant = compliance::is_compliant(&staff);
    let dbs_check = DbsCheckView {
        status: staff.dbs_check_status.clone(),
        expiry_date: staff.dbs_expiry_date.map(|d| d.format("%m/%d/%Y").to_string()),
        days_remaining: staff.dbs_expiry_date.map(|d| (d - today).num_days()),
    };
    let training = TrainingView {
        safeguarding: training_entry(&staff, TrainingKind::Safeguarding),
        first_aid: training_entry(&staff, TrainingKind::FirstAid),
        medication: training_entry(&staff, TrainingKind::Medication),
    };

    StaffDetail {
        id: staff.id,
        name: staff.name,
        role: staff.role,
        email: staff.email,
        status: staff.status,
        overall_compliance,
        is_compliant,
        dbs_check,
        training,
        training_certificates: staff.training_certificates,
        employment_history: staff.employment_history.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::compliance::fixtures::{compliant, staff};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn detail_reports_dbs_countdown() {
        let mut s = compliant("Ada");
        s.dbs_expiry_date = Some(date(2030, 7, 1));
        s.training_first_aid_date = Some(date(2029, 2, 3));

        let detail = staff_detail(s, date(2030, 6, 1));
        assert!(detail.is_compliant);
        assert_eq!(detail.overall_compliance, 100);
        assert_eq!(detail.dbs_check.expiry_date.as_deref(), Some("07/01/2030"));
        assert_eq!(detail.dbs_check.days_remaining, Some(30));
        assert_eq!(detail.training.first_aid.date.as_deref(), Some("2029-02-03"));
        assert_eq!(detail.training.first_aid.status, "complete");
    }

    #[test]
    fn detail_of_new_staff() {
        let detail = staff_detail(staff("Ben"), date(2030, 6, 1));
        assert!(!detail.is_compliant);
        assert_eq!(detail.overall_compliance, 0);
        assert_eq!(detail.dbs_check.days_remaining, None);
    }

    #[test]
    fn employment_history_is_parsed_and_capped() {
        let ok = parse_employment_history(
            r#"[{"employer":"Sunny Days","position":"Carer","startDate":"2020-01-01","endDate":null}]"#,
        )
        .unwrap();
        assert_eq!(ok[0].employer, "Sunny Days");
        assert_eq!(ok[0].start_date, Some(date(2020, 1, 1)));

        let four = r#"[{"employer":"a"},{"employer":"b"},{"employer":"c"},{"employer":"d"}]"#;
        assert!(matches!(parse_employment_history(four), Err(AppError::BadRequest(_))));

        assert!(matches!(parse_employment_history("not json"), Err(AppError::BadRequest(_))));
        assert!(matches!(
            parse_employment_history(r#"[{"employer":""}]"#),
            Err(AppError::ValidationError(_))
        ));
    }
}
