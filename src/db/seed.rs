// src/db/seed.rs
//
// Row builders for the `#[sqlx::test]` cases; each test gets a freshly migrated database.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::{HomeRepository, NewPolicy, NewUser, PolicyRepository, StaffRepository, UserRepository},
    models::{
        auth::{CallerContext, User, UserRole, UserStatus},
        policy::Policy,
        staff::{CreateStaffPayload, Staff},
    },
};

pub async fn home(pool: &PgPool, name: &str) -> Uuid {
    HomeRepository::new().create_home(pool, name).await.unwrap().id
}

pub async fn user(pool: &PgPool, home_id: Uuid, email: &str, role: UserRole) -> User {
    let name = email.split('@').next().unwrap_or(email);
    UserRepository::new(pool.clone())
        .create_user(
            pool,
            NewUser {
                home_id,
                name,
                email,
                password_hash: "not-a-real-hash",
                role,
                status: UserStatus::Active,
            },
        )
        .await
        .unwrap()
}

pub async fn staff(pool: &PgPool, home_id: Uuid, user_id: Option<Uuid>, email: &str) -> Staff {
    let name = email.split('@').next().unwrap_or(email);
    StaffRepository::new(pool.clone())
        .create_staff(pool, home_id, user_id, &CreateStaffPayload::for_login(name, email))
        .await
        .unwrap()
}

pub async fn policy(pool: &PgPool, home_id: Uuid, title: &str, assigned: &[Uuid]) -> Policy {
    PolicyRepository::new(pool.clone())
        .create_policy(NewPolicy {
            home_id,
            title,
            category: "Safeguarding",
            version: "1.0",
            status: "high",
            document: "policy.pdf",
            assigned_staff: assigned,
            last_updated: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        })
        .await
        .unwrap()
}

pub fn caller(user: &User) -> CallerContext {
    CallerContext {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
        home_id: user.home_id,
    }
}
