// src/services/activity_service.rs

use axum::http::Method;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{ListQuery, Paginated},
    },
    db::{ActivityRepository, UserRepository},
    models::activity::{ActivityLogView, NewActivityLog},
    services::scope::Scope,
};

/// Only state-changing requests are logged.
pub fn is_logged_method(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::DELETE)
}

/// `/api/staff/123` -> `staff`.
pub fn category_of(path: &str) -> String {
    path.split('/')
        .nth(2)
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

pub fn activity_entry(user_id: Uuid, user_name: &str, method: &Method, path: &str) -> NewActivityLog {
    let action = format!("{method} {path}");
    NewActivityLog {
        user_id,
        user_name: user_name.to_string(),
        category: category_of(path),
        details: format!("User {user_name} performed {action}"),
        action,
        status: "success".to_string(),
    }
}

#[derive(Clone)]
pub struct ActivityService {
    activity_repo: ActivityRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl ActivityService {
    pub fn new(activity_repo: ActivityRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { activity_repo, user_repo, pool }
    }

    /// Name of the acting user, read before the request runs so a self-delete still logs it.
    pub async fn display_name(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
        let user = self.user_repo.find_by_id(&self.pool, user_id).await?;
        Ok(user.map(|u| u.name))
    }

    pub async fn record(&self, user_id: Uuid, user_name: &str, method: &Method, path: &str) -> Result<(), AppError> {
        self.activity_repo
            .insert_log(&activity_entry(user_id, user_name, method, path))
            .await
    }

    pub async fn list(&self, scope: &Scope, query: &ListQuery) -> Result<Paginated<ActivityLogView>, AppError> {
        let window = query.window();
        let (logs, total) = self.activity_repo.list_page(&scope.user_ids, query, window).await?;
        Ok(Paginated::new(logs, total, window).map(ActivityLogView::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_is_the_second_path_segment() {
        assert_eq!(category_of("/api/staff/123"), "staff");
        assert_eq!(category_of("/api/audit-checklist"), "audit-checklist");
        assert_eq!(category_of("/"), "unknown");
        assert_eq!(category_of("/api"), "unknown");
    }

    #[test]
    fn entry_describes_the_action() {
        let id = Uuid::new_v4();
        let entry = activity_entry(id, "Ada", &Method::DELETE, "/api/reports/42");
        assert_eq!(entry.action, "DELETE /api/reports/42");
        assert_eq!(entry.category, "reports");
        assert_eq!(entry.details, "User Ada performed DELETE /api/reports/42");
        assert_eq!(entry.status, "success");
        assert_eq!(entry.user_id, id);
    }

    #[test]
    fn reads_are_not_logged() {
        assert!(is_logged_method(&Method::POST));
        assert!(is_logged_method(&Method::PUT));
        assert!(is_logged_method(&Method::DELETE));
        assert!(!is_logged_method(&Method::GET));
        assert!(!is_logged_method(&Method::PATCH));
    }

    #[sqlx::test]
    async fn name_captured_before_a_self_delete_is_logged(pool: PgPool) {
        use crate::{db::seed, models::auth::UserRole};

        let home = seed::home(&pool, "Oak House").await;
        let ada = seed::user(&pool, home, "ada@oak.example", UserRole::Admin).await;
        let service = ActivityService::new(
            ActivityRepository::new(pool.clone()),
            UserRepository::new(pool.clone()),
            pool.clone(),
        );

        let name = service.display_name(ada.id).await.unwrap();
        assert_eq!(name.as_deref(), Some("ada"));

        UserRepository::new(pool.clone()).delete_user(&pool, ada.id).await.unwrap();
        assert_eq!(service.display_name(ada.id).await.unwrap(), None);

        let path = format!("/api/users/{}", ada.id);
        service
            .record(ada.id, name.as_deref().unwrap_or_default(), &Method::DELETE, &path)
            .await
            .unwrap();

        let details: String = sqlx::query_scalar("SELECT details FROM activity_logs WHERE user_id = $1")
            .bind(ada.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(details, format!("User ada performed DELETE {path}"));
    }
}
