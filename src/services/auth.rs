use std::collections::BTreeMap;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::db::{tutors, users};
use crate::error::AppError;
use crate::models::{LoginRequest, PublicUser, RegisterRequest, Role, User};

pub const DEFAULT_TUTOR_BIO: &str = "안녕하세요! 신규 튜터입니다.";
pub const UNSET_FIELD: &str = "미입력";
pub const DEFAULT_TUTOR_PRICE: i64 = 50_000;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("failed to hash password: {}", e);
            AppError::InternalServerError
        })
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("unreadable password hash: {}", e);
            false
        }
    }
}

/// Creates the account, and for tutors the placeholder profile, in one transaction.
pub async fn register(db: &SqlitePool, req: RegisterRequest) -> Result<User, AppError> {
    let email = req.email.trim();
    let name = req.name.trim();
    if email.is_empty() || req.password.is_empty() || name.is_empty() {
        return Err(AppError::BadRequest("Missing fields".to_string()));
    }

    let role = match req.role.as_deref().map(str::trim) {
        None | Some("") => Role::Student,
        Some(role) => role.parse::<Role>().map_err(AppError::BadRequest)?,
    };

    if users::find_by_email(db, email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let password_hash = hash_password(&req.password)?;

    let mut tx = db.begin().await?;
    let user = users::insert_user(&mut *tx, email, &password_hash, name, role)
        .await
        .map_err(unique_email)?;

    if role == Role::Tutor {
        let profile = tutors::NewProfile {
            bio: DEFAULT_TUTOR_BIO.to_string(),
            university: UNSET_FIELD.to_string(),
            major: UNSET_FIELD.to_string(),
            price: DEFAULT_TUTOR_PRICE,
            ..Default::default()
        };
        tutors::insert_profile(&mut *tx, &user.id, &profile).await?;
    }
    tx.commit().await?;

    info!("registered {} user {}", user.role, user.id);
    Ok(user)
}

fn unique_email(e: sqlx::Error) -> AppError {
    match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Email already exists".to_string())
        }
        _ => AppError::Database(e),
    }
}

/// Session cookies are plaintext, so the id in one may name a user that no
/// longer exists. Inserts referencing it then fail the foreign key check.
pub(crate) fn unknown_session_user(e: sqlx::Error) -> AppError {
    match e.as_database_error() {
        Some(db_err) if db_err.is_foreign_key_violation() => {
            AppError::Unauthorized("로그인이 필요합니다.".to_string())
        }
        _ => AppError::Database(e),
    }
}

pub async fn login(db: &SqlitePool, req: LoginRequest) -> Result<User, AppError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest("Missing fields".to_string()));
    }

    match users::find_by_email(db, email).await? {
        Some(user) if verify_password(&req.password, &user.password_hash) => Ok(user),
        _ => Err(AppError::Unauthorized("Invalid credentials".to_string())),
    }
}

/// Where the web client goes right after logging in.
pub fn login_redirect(user: &User) -> &'static str {
    match user.role {
        Role::Student if !user.is_onboarded => "/onboarding",
        _ => "/",
    }
}

/// Where the web client goes right after registering.
pub fn register_redirect(user: &User) -> &'static str {
    match user.role {
        Role::Tutor => "/tutor-register",
        Role::Student => "/onboarding",
    }
}

pub async fn complete_onboarding(
    db: &SqlitePool,
    user_id: &str,
    answers: &BTreeMap<u32, String>,
) -> Result<PublicUser, AppError> {
    let data = serde_json::to_string(answers).map_err(|e| AppError::BadRequest(e.to_string()))?;
    if !users::mark_onboarded(db, user_id, &data).await? {
        return Err(AppError::NotFound);
    }
    let user = users::find_by_id(db, user_id).await?.ok_or(AppError::NotFound)?;
    Ok(user.into())
}
