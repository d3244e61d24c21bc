// src/services/audit_service.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{ListQuery, Paginated},
    },
    db::{AuditRepository, StaffRepository},
    models::{
        audit::{
            AuditChecklist, AuditChecklistView, CreateAuditChecklistPayload, UpdateAuditChecklistPayload,
            MAX_EVIDENCE_FILES,
        },
        staff::StaffBrief,
    },
    services::{
        document_service::{DocumentKind, DocumentService, UploadedFile},
        scope::Scope,
    },
};

#[derive(Clone)]
pub struct AuditService {
    audit_repo: AuditRepository,
    staff_repo: StaffRepository,
    documents: DocumentService,
}

impl AuditService {
    pub fn new(audit_repo: AuditRepository, staff_repo: StaffRepository, documents: DocumentService) -> Self {
        Self { audit_repo, staff_repo, documents }
    }

    pub async fn list(&self, scope: &Scope, query: &ListQuery) -> Result<Paginated<AuditChecklistView>, AppError> {
        let window = query.window();
        let (items, total) = self
            .audit_repo
            .list_page(scope.caller.home_id, scope.own_staff_id(), query, window)
            .await?;

        let views = self.expand(items).await?;
        Ok(Paginated::new(views, total, window))
    }

    async fn expand(&self, items: Vec<AuditChecklist>) -> Result<Vec<AuditChecklistView>, AppError> {
        let mut ids: Vec<Uuid> = items.iter().filter_map(|i| i.assigned_to).collect();
        ids.sort_unstable();
        ids.dedup();

        let briefs: HashMap<Uuid, StaffBrief> = self
            .staff_repo
            .find_briefs(&ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(items
            .into_iter()
            .map(|item| {
                let assignee = item.assigned_to.and_then(|id| briefs.get(&id).cloned());
                AuditChecklistView::new(item, assignee)
            })
            .collect())
    }

    async fn find_visible(&self, scope: &Scope, id: Uuid) -> Result<AuditChecklist, AppError> {
        let item = self
            .audit_repo
            .find_in_home(id, scope.caller.home_id)
            .await?
            .ok_or_else(|| AppError::not_found("Checklist item"))?;

        match scope.own_staff_id() {
            Some(own) if item.assigned_to != Some(own) => Err(AppError::not_found("Checklist item")),
            _ => Ok(item),
        }
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<AuditChecklistView, AppError> {
        let item = self.find_visible(scope, id).await?;
        let mut views = self.expand(vec![item]).await?;
        views.pop().ok_or_else(|| AppError::not_found("Checklist item"))
    }

    fn check_assignee(scope: &Scope, assigned_to: Option<Uuid>) -> Result<(), AppError> {
        match assigned_to {
            Some(id) if !scope.can_see_staff(id) => {
                Err(AppError::BadRequest("Assigned staff must belong to your home".into()))
            }
            _ => Ok(()),
        }
    }

    pub async fn create(&self, scope: &Scope, payload: &CreateAuditChecklistPayload) -> Result<AuditChecklist, AppError> {
        Self::check_assignee(scope, payload.assigned_to)?;
        self.audit_repo.create_item(scope.caller.home_id, payload).await
    }

    /// Admins edit any item of the home; staff only the items assigned to them, and
    /// cannot hand them to someone else.
    pub async fn update(
        &self,
        scope: &Scope,
        id: Uuid,
        payload: &UpdateAuditChecklistPayload,
    ) -> Result<AuditChecklist, AppError> {
        self.find_visible(scope, id).await?;

        if let (Some(own), Some(target)) = (scope.own_staff_id(), payload.assigned_to) {
            if own != target {
                return Err(AppError::Forbidden("Only an admin can reassign checklist items".into()));
            }
        }
        Self::check_assignee(scope, payload.assigned_to)?;

        self.audit_repo.update_item(id, payload).await
    }

    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), AppError> {
        let existing = self.find_visible(scope, id).await?;
        self.audit_repo.delete_item(id).await?;
        self.documents
            .remove_best_effort(DocumentKind::Evidence, &existing.evidence)
            .await;
        Ok(())
    }

    /// Replaces the item's evidence set with the uploaded files.
    pub async fn upload_evidence(
        &self,
        scope: &Scope,
        id: Uuid,
        files: &[UploadedFile],
    ) -> Result<AuditChecklist, AppError> {
        let existing = self.find_visible(scope, id).await?;
        if files.is_empty() {
            return Err(AppError::Upload("No evidence files uploaded".into()));
        }

        let stored = self
            .documents
            .save_all(DocumentKind::Evidence, files, MAX_EVIDENCE_FILES)
            .await?;

        let updated = self
            .audit_repo
            .set_evidence(id, &stored)
            .await
            .inspect_err(|e| self.documents.report_orphans(DocumentKind::Evidence, &stored, e))?;

        self.documents
            .remove_best_effort(DocumentKind::Evidence, &existing.evidence)
            .await;
        Ok(updated)
    }
}
