// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{HomeRepository, NewUser, StaffRepository, UserRepository},
    models::{
        auth::{AuthResponse, CallerContext, Claims, RegisterResponse, RegisterUserPayload, User, UserRole, UserStatus},
        staff::CreateStaffPayload,
    },
};

// ---
// Password hashing (off the async runtime)
// ---

pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("password hashing task failed: {e}"))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {e}"))??;
    Ok(valid)
}

// ---
// JWT
// ---

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            home_id: user.home_id,
            exp: (now + self.ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<CallerContext, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims.into())
            .map_err(|_| AppError::InvalidToken)
    }
}

// ---
// Registration and login
// ---

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    staff_repo: StaffRepository,
    home_repo: HomeRepository,
    jwt: JwtKeys,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        staff_repo: StaffRepository,
        home_repo: HomeRepository,
        jwt: JwtKeys,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, staff_repo, home_repo, jwt, pool }
    }

    /// With a home code the caller joins that home as staff; otherwise a new home is
    /// created and the caller becomes its admin.
    pub async fn register(&self, payload: &RegisterUserPayload) -> Result<RegisterResponse, AppError> {
        let password_hash = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;

        let code = payload.code.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let (home_id, role) = match code {
            Some(code) => {
                let home_id = Uuid::parse_str(code)
                    .map_err(|_| AppError::BadRequest("Invalid home code".into()))?;
                let home = self
                    .home_repo
                    .find_by_id(&mut *tx, home_id)
                    .await?
                    .ok_or_else(|| AppError::BadRequest("Invalid home code".into()))?;
                (home.id, UserRole::Staff)
            }
            None => {
                let home_name = payload
                    .home_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| {
                        AppError::BadRequest("A home code or a home name is required".into())
                    })?;
                let home = self.home_repo.create_home(&mut *tx, home_name).await?;
                tracing::info!(home_id = %home.id, "Home created");
                (home.id, UserRole::Admin)
            }
        };

        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                NewUser {
                    home_id,
                    name: &payload.name,
                    email: &payload.email,
                    password_hash: &password_hash,
                    role,
                    status: UserStatus::Active,
                },
            )
            .await?;

        if role == UserRole::Staff {
            attach_staff_profile(&self.staff_repo, &mut *tx, &user).await?;
        }

        tx.commit().await?;

        tracing::info!(user_id = %user.id, role = ?user.role, "User registered");
        Ok(RegisterResponse {
            message: "Account created successfully!".into(),
            user,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(&self.pool, email)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let user = self.user_repo.record_login(&self.pool, user.id).await?;
        let token = self.jwt.issue(&user)?;

        Ok(AuthResponse { token, user })
    }
}

/// Links an existing unlinked staff row with the same email in the home, or creates one.
pub(crate) async fn attach_staff_profile(
    staff_repo: &StaffRepository,
    conn: &mut PgConnection,
    user: &User,
) -> Result<(), AppError> {
    match staff_repo.find_by_email(&mut *conn, &user.email).await? {
        Some(existing) if existing.user_id.is_none() && existing.home_id == user.home_id => {
            staff_repo.link_user(&mut *conn, existing.id, user.id).await
        }
        Some(_) => Err(AppError::Conflict(
            "Staff with this email already exists.".into(),
        )),
        None => {
            staff_repo
                .create_staff(
                    &mut *conn,
                    user.home_id,
                    Some(user.id),
                    &CreateStaffPayload::for_login(&user.name, &user.email),
                )
                .await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            home_id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_token_carries_the_caller() {
        let keys = JwtKeys::new("test-secret", 60);
        let u = user(UserRole::Readonly);

        let caller = keys.verify(&keys.issue(&u).unwrap()).unwrap();
        assert_eq!(caller.id, u.id);
        assert_eq!(caller.home_id, u.home_id);
        assert_eq!(caller.role, UserRole::Readonly);
        assert_eq!(caller.email, u.email);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = JwtKeys::new("one", 60).issue(&user(UserRole::Admin)).unwrap();
        let err = JwtKeys::new("two", 60).verify(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::new("test-secret", -10);
        let token = keys.issue(&user(UserRole::Admin)).unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hashed = hash_password("secret1").await.unwrap();
        assert!(verify_password("secret1", &hashed).await.unwrap());
        assert!(!verify_password("secret2", &hashed).await.unwrap());
    }
}
