// src/services/scope.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{StaffRepository, UserRepository},
    models::auth::{CallerContext, UserRole},
};

/// What a caller may see: staff callers their own record, everyone else their home.
/// The dashboard widens every role to the home.
#[derive(Debug, Clone)]
pub struct Scope {
    pub caller: CallerContext,
    pub staff_ids: Vec<Uuid>,
    pub user_ids: Vec<Uuid>,
    own_only: bool,
}

impl Scope {
    pub fn is_own_only(&self) -> bool {
        self.own_only
    }

    /// The caller's own staff row, for staff callers.
    pub fn own_staff_id(&self) -> Option<Uuid> {
        if self.is_own_only() {
            self.staff_ids.first().copied()
        } else {
            None
        }
    }

    pub fn can_see_staff(&self, staff_id: Uuid) -> bool {
        self.staff_ids.contains(&staff_id)
    }

    pub fn can_see_user(&self, user_id: Uuid) -> bool {
        self.user_ids.contains(&user_id)
    }
}

#[derive(Clone)]
pub struct ScopeResolver {
    user_repo: UserRepository,
    staff_repo: StaffRepository,
    pool: PgPool,
}

impl ScopeResolver {
    pub fn new(user_repo: UserRepository, staff_repo: StaffRepository, pool: PgPool) -> Self {
        Self { user_repo, staff_repo, pool }
    }

    pub async fn resolve(&self, caller: &CallerContext) -> Result<Scope, AppError> {
        match caller.role {
            UserRole::Staff => {
                let own = self
                    .staff_repo
                    .find_for_user(&self.pool, caller.id, &caller.email, caller.home_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Staff record"))?;
                Ok(Scope {
                    caller: caller.clone(),
                    staff_ids: vec![own.id],
                    user_ids: vec![caller.id],
                    own_only: true,
                })
            }
            UserRole::Admin | UserRole::Readonly => self.home_scope(caller).await,
        }
    }

    /// Everything in the caller's home, whatever their role. Backs the dashboard.
    pub async fn home_scope(&self, caller: &CallerContext) -> Result<Scope, AppError> {
        let user_ids = self.user_repo.list_ids_by_home(caller.home_id).await?;
        let staff_ids = self
            .staff_repo
            .list_visible_ids(caller.home_id, &user_ids)
            .await?;

        Ok(Scope {
            caller: caller.clone(),
            staff_ids,
            user_ids,
            own_only: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: UserRole) -> CallerContext {
        CallerContext {
            id: Uuid::new_v4(),
            email: "caller@example.com".into(),
            role,
            home_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn staff_scope_is_own_record_only() {
        let own = Uuid::new_v4();
        let c = caller(UserRole::Staff);
        let scope = Scope {
            staff_ids: vec![own],
            user_ids: vec![c.id],
            caller: c,
            own_only: true,
        };

        assert!(scope.is_own_only());
        assert_eq!(scope.own_staff_id(), Some(own));
        assert!(scope.can_see_staff(own));
        assert!(!scope.can_see_staff(Uuid::new_v4()));
    }

    #[test]
    fn admin_scope_covers_home() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let scope = Scope {
            caller: caller(UserRole::Admin),
            staff_ids: vec![a, b],
            user_ids: vec![Uuid::new_v4()],
            own_only: false,
        };

        assert!(!scope.is_own_only());
        assert_eq!(scope.own_staff_id(), None);
        assert!(scope.can_see_staff(a) && scope.can_see_staff(b));
        assert!(!scope.can_see_user(Uuid::new_v4()));
    }

    #[sqlx::test]
    async fn admin_sees_only_their_own_home(pool: PgPool) {
        use crate::db::seed;

        let oak = seed::home(&pool, "Oak House").await;
        let elm = seed::home(&pool, "Elm House").await;
        let oak_admin = seed::user(&pool, oak, "admin@oak.example", UserRole::Admin).await;
        let oak_a = seed::staff(&pool, oak, None, "a@oak.example").await;
        let oak_b = seed::staff(&pool, oak, None, "b@oak.example").await;
        let elm_user = seed::user(&pool, elm, "c@elm.example", UserRole::Staff).await;
        let elm_c = seed::staff(&pool, elm, Some(elm_user.id), "c@elm.example").await;

        let resolver = ScopeResolver::new(
            UserRepository::new(pool.clone()),
            StaffRepository::new(pool.clone()),
            pool.clone(),
        );
        let scope = resolver.resolve(&seed::caller(&oak_admin)).await.unwrap();

        assert!(scope.can_see_staff(oak_a.id) && scope.can_see_staff(oak_b.id));
        assert!(!scope.can_see_staff(elm_c.id));
        assert_eq!(scope.staff_ids.len(), 2);
        assert_eq!(scope.user_ids, vec![oak_admin.id]);
    }

    #[sqlx::test]
    async fn staff_scope_is_narrow_but_home_scope_is_not(pool: PgPool) {
        use crate::db::seed;

        let oak = seed::home(&pool, "Oak House").await;
        let carer = seed::user(&pool, oak, "ada@oak.example", UserRole::Staff).await;
        let own = seed::staff(&pool, oak, Some(carer.id), "ada@oak.example").await;
        let colleague = seed::staff(&pool, oak, None, "ben@oak.example").await;

        let resolver = ScopeResolver::new(
            UserRepository::new(pool.clone()),
            StaffRepository::new(pool.clone()),
            pool.clone(),
        );
        let caller = seed::caller(&carer);

        let scope = resolver.resolve(&caller).await.unwrap();
        assert_eq!(scope.staff_ids, vec![own.id]);

        let home = resolver.home_scope(&caller).await.unwrap();
        assert!(home.can_see_staff(own.id) && home.can_see_staff(colleague.id));
        assert!(!home.is_own_only());
        assert_eq!(home.own_staff_id(), None);
    }
}
