use sqlx::SqlitePool;

use crate::db::{new_id, now};

pub async fn find_like(
    db: &SqlitePool,
    student_id: &str,
    tutor_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM likes WHERE student_id = ? AND tutor_id = ?")
        .bind(student_id)
        .bind(tutor_id)
        .fetch_optional(db)
        .await
}

pub async fn insert_like(
    db: &SqlitePool,
    student_id: &str,
    tutor_id: &str,
    tutor_profile_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO likes (id, student_id, tutor_id, tutor_profile_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(student_id, tutor_id) DO NOTHING
        "#,
    )
    .bind(new_id())
    .bind(student_id)
    .bind(tutor_id)
    .bind(tutor_profile_id)
    .bind(now())
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete_like(db: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM likes WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
