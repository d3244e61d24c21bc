// src/services/policy_service.rs

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{ListQuery, Paginated},
    },
    db::{NewPolicy, PolicyRepository, StaffRepository},
    models::{
        auth::CallerContext,
        policy::{Policy, PolicyFields, PolicyView},
        staff::StaffBrief,
    },
    services::{
        document_service::{DocumentKind, DocumentService, UploadedFile},
        scope::Scope,
    },
};

const MISSING_FIELDS: &str = "All fields and document are required";

#[derive(Clone)]
pub struct PolicyService {
    policy_repo: PolicyRepository,
    staff_repo: StaffRepository,
    documents: DocumentService,
    pool: PgPool,
}

impl PolicyService {
    pub fn new(
        policy_repo: PolicyRepository,
        staff_repo: StaffRepository,
        documents: DocumentService,
        pool: PgPool,
    ) -> Self {
        Self { policy_repo, staff_repo, documents, pool }
    }

    /// Admins and readonly users see the home's policies; staff only those assigned to them.
    pub async fn list(&self, scope: &Scope, query: &ListQuery) -> Result<Paginated<PolicyView>, AppError> {
        let window = query.window();
        let (policies, total) = self
            .policy_repo
            .list_page(scope.caller.home_id, scope.own_staff_id(), query, window)
            .await?;

        let views = self.expand(policies).await?;
        Ok(Paginated::new(views, total, window))
    }

    async fn expand(&self, policies: Vec<Policy>) -> Result<Vec<PolicyView>, AppError> {
        let mut ids: Vec<Uuid> = policies.iter().flat_map(|p| p.assigned_staff.iter().copied()).collect();
        ids.sort_unstable();
        ids.dedup();

        let briefs: HashMap<Uuid, StaffBrief> = self
            .staff_repo
            .find_briefs(&ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(policies
            .into_iter()
            .map(|p| {
                let assigned = p
                    .assigned_staff
                    .iter()
                    .filter_map(|id| briefs.get(id).cloned())
                    .collect();
                PolicyView::new(p, assigned)
            })
            .collect())
    }

    async fn find_visible(&self, scope: &Scope, id: Uuid) -> Result<Policy, AppError> {
        let policy = self
            .policy_repo
            .find_in_home(id, scope.caller.home_id)
            .await?
            .ok_or_else(|| AppError::not_found("Policy"))?;

        match scope.own_staff_id() {
            Some(own) if !policy.is_assigned_to(own) => Err(AppError::not_found("Policy")),
            _ => Ok(policy),
        }
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<PolicyView, AppError> {
        let policy = self.find_visible(scope, id).await?;
        let mut views = self.expand(vec![policy]).await?;
        views.pop().ok_or_else(|| AppError::not_found("Policy"))
    }

    fn check_assignees(scope: &Scope, fields: &PolicyFields) -> Result<(), AppError> {
        let unknown = fields
            .assigned_staff
            .iter()
            .flatten()
            .any(|id| !scope.can_see_staff(*id));
        if unknown {
            return Err(AppError::BadRequest("Assigned staff must belong to your home".into()));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        scope: &Scope,
        fields: &PolicyFields,
        document: Option<&UploadedFile>,
    ) -> Result<Policy, AppError> {
        let (Some(title), Some(category), Some(version), Some(review_date), Some(priority), Some(document)) = (
            fields.title.as_deref(),
            fields.category.as_deref(),
            fields.version.as_deref(),
            fields.review_date,
            fields.priority.as_deref(),
            document,
        ) else {
            return Err(AppError::BadRequest(MISSING_FIELDS.into()));
        };
        Self::check_assignees(scope, fields)?;

        let stored = self.documents.save(DocumentKind::Policies, document).await?;
        let assigned = fields.assigned_staff.clone().unwrap_or_default();

        let created = self
            .policy_repo
            .create_policy(NewPolicy {
                home_id: scope.caller.home_id,
                title,
                category,
                version,
                status: priority,
                document: &stored,
                assigned_staff: &assigned,
                last_updated: review_date,
            })
            .await;

        created.inspect_err(|e| {
            self.documents
                .report_orphans(DocumentKind::Policies, std::slice::from_ref(&stored), e)
        })
    }

    pub async fn update(
        &self,
        scope: &Scope,
        id: Uuid,
        fields: &PolicyFields,
        document: Option<&UploadedFile>,
    ) -> Result<Policy, AppError> {
        let existing = self.find_visible(scope, id).await?;
        Self::check_assignees(scope, fields)?;

        let stored = match document {
            Some(file) => Some(self.documents.save(DocumentKind::Policies, file).await?),
            None => None,
        };

        let updated = match self.policy_repo.update_policy(id, fields, stored.as_deref()).await {
            Ok(policy) => policy,
            Err(e) => {
                if let Some(name) = &stored {
                    self.documents
                        .report_orphans(DocumentKind::Policies, std::slice::from_ref(name), &e);
                }
                return Err(e);
            }
        };

        if stored.is_some() {
            self.documents
                .remove_best_effort(DocumentKind::Policies, &[existing.document])
                .await;
        }
        Ok(updated)
    }

    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), AppError> {
        let existing = self.find_visible(scope, id).await?;
        self.policy_repo.delete_policy(id).await?;
        self.documents
            .remove_best_effort(DocumentKind::Policies, &[existing.document])
            .await;
        Ok(())
    }

    /// Staff acknowledge on their own behalf, only policies assigned to them; a repeat
    /// acknowledgement is a 400.
    pub async fn acknowledge(&self, caller: &CallerContext, id: Uuid) -> Result<Policy, AppError> {
        let staff = self
            .staff_repo
            .find_for_user(&self.pool, caller.id, &caller.email, caller.home_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("Only staff members can acknowledge policies".into()))?;

        self.policy_repo
            .find_in_home(id, caller.home_id)
            .await?
            .filter(|p| p.is_assigned_to(staff.id))
            .ok_or_else(|| AppError::not_found("Policy"))?;

        self.policy_repo
            .acknowledge(id, staff.id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Policy already acknowledged".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::seed, models::auth::UserRole};

    fn service(pool: &PgPool) -> PolicyService {
        PolicyService::new(
            PolicyRepository::new(pool.clone()),
            StaffRepository::new(pool.clone()),
            DocumentService::new(std::env::temp_dir().join(format!("docs-{}", Uuid::new_v4()))),
            pool.clone(),
        )
    }

    #[sqlx::test]
    async fn second_acknowledgement_is_rejected(pool: PgPool) {
        let home = seed::home(&pool, "Oak House").await;
        let user = seed::user(&pool, home, "ada@example.com", UserRole::Staff).await;
        let staff = seed::staff(&pool, home, Some(user.id), "ada@example.com").await;
        let policy = seed::policy(&pool, home, "Fire Safety", &[staff.id]).await;
        let service = service(&pool);

        let first = service.acknowledge(&seed::caller(&user), policy.id).await.unwrap();
        assert_eq!(first.acknowledgements, 1);
        assert_eq!(first.acknowledged_staff, vec![staff.id]);

        let second = service.acknowledge(&seed::caller(&user), policy.id).await;
        assert!(matches!(second, Err(AppError::BadRequest(msg)) if msg == "Policy already acknowledged"));

        let stored = PolicyRepository::new(pool.clone())
            .find_in_home(policy.id, home)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.acknowledgements, 1);
    }

    #[sqlx::test]
    async fn unassigned_staff_cannot_acknowledge(pool: PgPool) {
        let home = seed::home(&pool, "Oak House").await;
        let user = seed::user(&pool, home, "ben@example.com", UserRole::Staff).await;
        seed::staff(&pool, home, Some(user.id), "ben@example.com").await;
        let other = seed::staff(&pool, home, None, "cy@example.com").await;
        let policy = seed::policy(&pool, home, "Lone Working", &[other.id]).await;

        let result = service(&pool).acknowledge(&seed::caller(&user), policy.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let stored = PolicyRepository::new(pool.clone())
            .find_in_home(policy.id, home)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.acknowledgements, 0);
        assert!(stored.acknowledged_staff.is_empty());
    }
}
