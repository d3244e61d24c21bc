// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Paginated},
    db::{NewUser, StaffRepository, UserRepository},
    models::{
        auth::{CallerContext, User, UserRole, UserStatus},
        user::{ChangePasswordPayload, InviteUserPayload, ProfileResponse, UpdateProfilePayload, UpdateUserPayload, UserListQuery},
    },
    services::{
        auth::{attach_staff_profile, hash_password, verify_password},
        scope::Scope,
    },
};

const EMAIL_IN_USE: &str = "Email already in use by another user";

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    staff_repo: StaffRepository,
    invite_password: String,
    pool: PgPool,
}

impl UserService {
    pub fn new(
        user_repo: UserRepository,
        staff_repo: StaffRepository,
        invite_password: String,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, staff_repo, invite_password, pool }
    }

    pub async fn list(&self, scope: &Scope, query: &UserListQuery) -> Result<Paginated<User>, AppError> {
        let window = query.window();
        let (users, total) = self.user_repo.list_page(&scope.user_ids, query, window).await?;
        Ok(Paginated::new(users, total, window))
    }

    /// Invited users join the admin's home, start inactive and sign in with the default password.
    pub async fn invite(&self, caller: &CallerContext, payload: &InviteUserPayload) -> Result<User, AppError> {
        if self.user_repo.find_by_email(&self.pool, &payload.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".into()));
        }

        let password_hash = hash_password(&self.invite_password).await?;

        let mut tx = self.pool.begin().await?;
        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                NewUser {
                    home_id: caller.home_id,
                    name: &payload.name,
                    email: &payload.email,
                    password_hash: &password_hash,
                    role: payload.role,
                    status: UserStatus::Inactive,
                },
            )
            .await?;

        if user.role == UserRole::Staff {
            attach_staff_profile(&self.staff_repo, &mut *tx, &user).await?;
        }
        tx.commit().await?;

        tracing::info!(user_id = %user.id, invited_by = %caller.id, "User invited");
        Ok(user)
    }

    async fn find_visible(&self, scope: &Scope, id: Uuid) -> Result<User, AppError> {
        if !scope.can_see_user(id) {
            return Err(AppError::not_found("User"));
        }
        self.user_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Keeps the staff profile in step with the login: dropped when the role leaves
    /// `staff`, created when it becomes `staff`, renamed otherwise.
    pub async fn update(&self, scope: &Scope, id: Uuid, payload: &UpdateUserPayload) -> Result<User, AppError> {
        let existing = self.find_visible(scope, id).await?;

        if let Some(email) = payload.email.as_deref() {
            if self.user_repo.email_taken_by_other(&self.pool, email, id).await? {
                return Err(AppError::Conflict(EMAIL_IN_USE.into()));
            }
        }

        let mut tx = self.pool.begin().await?;
        let updated = self
            .user_repo
            .update_user(
                &mut *tx,
                id,
                payload.name.as_deref(),
                payload.email.as_deref(),
                payload.role,
                payload.status,
            )
            .await?;

        match (existing.role, updated.role) {
            (UserRole::Staff, UserRole::Staff) => {
                self.staff_repo
                    .sync_from_user(&mut *tx, updated.id, &updated.name, &updated.email)
                    .await?;
            }
            (UserRole::Staff, _) => {
                self.staff_repo
                    .delete_for_user(&mut *tx, existing.id, &existing.email, existing.home_id)
                    .await?;
            }
            (_, UserRole::Staff) => {
                attach_staff_profile(&self.staff_repo, &mut *tx, &updated).await?;
            }
            _ => {}
        }
        tx.commit().await?;

        Ok(updated)
    }

    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), AppError> {
        let existing = self.find_visible(scope, id).await?;

        let mut tx = self.pool.begin().await?;
        if existing.role == UserRole::Staff {
            let removed = self
                .staff_repo
                .delete_for_user(&mut *tx, existing.id, &existing.email, existing.home_id)
                .await?;
            tracing::debug!(user_id = %id, removed, "Staff profile removed with user");
        }
        self.user_repo.delete_user(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(())
    }

    // ---
    // Profile
    // ---

    async fn find_profile(&self, caller: &CallerContext, id: Uuid) -> Result<User, AppError> {
        let user = self
            .user_repo
            .find_by_id(&self.pool, id)
            .await?
            .filter(|u| u.home_id == caller.home_id)
            .ok_or_else(|| AppError::not_found("User"))?;

        if !can_manage_profile(caller, &user) {
            return Err(AppError::Forbidden("You can only manage your own profile".into()));
        }
        Ok(user)
    }

    pub async fn profile(&self, caller: &CallerContext, id: Uuid) -> Result<ProfileResponse, AppError> {
        let user = self.find_profile(caller, id).await?;
        Ok(ProfileResponse::from(&user))
    }

    pub async fn update_profile(
        &self,
        caller: &CallerContext,
        id: Uuid,
        payload: &UpdateProfilePayload,
    ) -> Result<User, AppError> {
        let user = self.find_profile(caller, id).await?;

        if let Some(email) = payload.email.as_deref() {
            if self.user_repo.email_taken_by_other(&self.pool, email, id).await? {
                return Err(AppError::Conflict("Email already in use".into()));
            }
        }

        let mut tx = self.pool.begin().await?;
        let updated = self
            .user_repo
            .update_user(&mut *tx, id, payload.name.as_deref(), payload.email.as_deref(), None, None)
            .await?;
        if user.role == UserRole::Staff {
            self.staff_repo
                .sync_from_user(&mut *tx, updated.id, &updated.name, &updated.email)
                .await?;
        }
        tx.commit().await?;

        Ok(updated)
    }

    pub async fn change_password(
        &self,
        caller: &CallerContext,
        id: Uuid,
        payload: &ChangePasswordPayload,
    ) -> Result<(), AppError> {
        let user = self.find_profile(caller, id).await?;

        if !verify_password(&payload.current_password, &user.password_hash).await? {
            return Err(AppError::BadRequest("Incorrect current password".into()));
        }
        if payload.new_password != payload.confirm_password {
            return Err(AppError::BadRequest("New passwords do not match".into()));
        }

        let password_hash = hash_password(&payload.new_password).await?;
        self.user_repo.update_password(&self.pool, id, &password_hash).await?;

        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }
}

/// A profile is managed by its owner or by an admin of the same home.
pub fn can_manage_profile(caller: &CallerContext, user: &User) -> bool {
    caller.id == user.id || (caller.is_admin() && caller.home_id == user.home_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(home_id: Uuid) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            home_id,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            role: UserRole::Staff,
            status: UserStatus::Active,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn caller(id: Uuid, home_id: Uuid, role: UserRole) -> CallerContext {
        CallerContext { id, email: "c@example.com".into(), role, home_id }
    }

    #[test]
    fn owner_manages_own_profile() {
        let u = user(Uuid::new_v4());
        assert!(can_manage_profile(&caller(u.id, u.home_id, UserRole::Staff), &u));
    }

    #[test]
    fn admin_of_same_home_manages_profiles() {
        let u = user(Uuid::new_v4());
        assert!(can_manage_profile(&caller(Uuid::new_v4(), u.home_id, UserRole::Admin), &u));
        assert!(!can_manage_profile(&caller(Uuid::new_v4(), Uuid::new_v4(), UserRole::Admin), &u));
    }

    #[test]
    fn other_staff_and_readonly_cannot() {
        let u = user(Uuid::new_v4());
        assert!(!can_manage_profile(&caller(Uuid::new_v4(), u.home_id, UserRole::Staff), &u));
        assert!(!can_manage_profile(&caller(Uuid::new_v4(), u.home_id, UserRole::Readonly), &u));
    }

    fn service(pool: &PgPool) -> UserService {
        UserService::new(
            UserRepository::new(pool.clone()),
            StaffRepository::new(pool.clone()),
            "User@123".into(),
            pool.clone(),
        )
    }

    #[sqlx::test]
    async fn deleting_a_staff_login_removes_its_profile(pool: PgPool) {
        use crate::{db::seed, services::scope::ScopeResolver};

        let home = seed::home(&pool, "Oak House").await;
        let admin = seed::user(&pool, home, "admin@example.com", UserRole::Admin).await;
        let carer = seed::user(&pool, home, "ada@example.com", UserRole::Staff).await;
        let viewer = seed::user(&pool, home, "ro@example.com", UserRole::Readonly).await;
        let carer_profile = seed::staff(&pool, home, Some(carer.id), "ada@example.com").await;
        let viewer_profile = seed::staff(&pool, home, Some(viewer.id), "ro@example.com").await;

        let staff_repo = StaffRepository::new(pool.clone());
        let scope = ScopeResolver::new(UserRepository::new(pool.clone()), staff_repo.clone(), pool.clone())
            .resolve(&seed::caller(&admin))
            .await
            .unwrap();
        let service = service(&pool);

        service.delete(&scope, carer.id).await.unwrap();
        assert!(staff_repo.find_by_id(carer_profile.id).await.unwrap().is_none());

        service.delete(&scope, viewer.id).await.unwrap();
        let kept = staff_repo.find_by_id(viewer_profile.id).await.unwrap().unwrap();
        assert_eq!(kept.user_id, None);
        assert_eq!(kept.email, "ro@example.com");
    }
}
