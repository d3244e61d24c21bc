// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::auth::{CallerContext, UserRole},
};

/// A set of roles allowed through a route.
pub trait RoleRequirement: Send + Sync + 'static {
    fn allows(role: UserRole) -> bool;
    fn message() -> &'static str;
}

/// Guard extractor: rejects with 403 unless the caller's role satisfies `T`.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleRequirement,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = parts
            .extensions
            .get::<CallerContext>()
            .ok_or(AppError::InvalidToken)?;

        if !T::allows(caller.role) {
            return Err(AppError::Forbidden(T::message().to_string()));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// Requirements
// ---

pub struct AdminOnly;
impl RoleRequirement for AdminOnly {
    fn allows(role: UserRole) -> bool {
        role == UserRole::Admin
    }
    fn message() -> &'static str {
        "Admin access required"
    }
}

/// Anyone who may change data: admins and staff, never readonly users.
pub struct Writer;
impl RoleRequirement for Writer {
    fn allows(role: UserRole) -> bool {
        matches!(role, UserRole::Admin | UserRole::Staff)
    }
    fn message() -> &'static str {
        "Read-only users cannot modify data"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use uuid::Uuid;

    fn parts_for(role: Option<UserRole>) -> Parts {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        if let Some(role) = role {
            parts.extensions.insert(CallerContext {
                id: Uuid::new_v4(),
                email: "someone@example.com".into(),
                role,
                home_id: Uuid::new_v4(),
            });
        }
        parts
    }

    async fn check<T: RoleRequirement>(role: Option<UserRole>) -> Result<(), AppError> {
        RequireRole::<T>::from_request_parts(&mut parts_for(role), &())
            .await
            .map(|_| ())
    }

    #[tokio::test]
    async fn admin_only_rejects_everyone_else() {
        assert!(check::<AdminOnly>(Some(UserRole::Admin)).await.is_ok());

        let err = check::<AdminOnly>(Some(UserRole::Staff)).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m == "Admin access required"));
        assert!(check::<AdminOnly>(Some(UserRole::Readonly)).await.is_err());
    }

    #[tokio::test]
    async fn readonly_callers_never_write() {
        assert!(check::<Writer>(Some(UserRole::Admin)).await.is_ok());
        assert!(check::<Writer>(Some(UserRole::Staff)).await.is_ok());

        let err = check::<Writer>(Some(UserRole::Readonly)).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unauthenticated_requests_are_401() {
        let err = check::<Writer>(None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
