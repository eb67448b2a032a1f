use sqlx::{SqliteExecutor, SqlitePool};

use crate::db::{new_id, now};
use crate::models::{Role, User};

const USER_COLUMNS: &str = r#"
    id, email, password_hash, name, role, is_onboarded, onboarding_data, created_at, updated_at
"#;

pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn find_by_id<'e, E>(db: E, id: &str) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_user<'e, E>(
    db: E,
    email: &str,
    password_hash: &str,
    name: &str,
    role: Role,
) -> Result<User, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = new_id();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO users
            (id, email, password_hash, name, role, is_onboarded, onboarding_data, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 0, NULL, ?6, ?6)
        "#,
    )
    .bind(&id)
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(role)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(User {
        id,
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        name: name.to_string(),
        role,
        is_onboarded: false,
        onboarding_data: None,
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Returns `false` when no such user exists.
pub async fn mark_onboarded(
    db: &SqlitePool,
    id: &str,
    onboarding_data: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET is_onboarded = 1,
            onboarding_data = ?1,
            updated_at = ?2
        WHERE id = ?3
        "#,
    )
    .bind(onboarding_data)
    .bind(now())
    .bind(id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}
