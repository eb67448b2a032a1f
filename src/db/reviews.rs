use sqlx::{SqliteExecutor, SqlitePool};

use crate::db::{new_id, now};
use crate::models::{Review, ReviewView};

pub async fn insert_review<'e, E>(
    db: E,
    author_id: &str,
    tutor_id: &str,
    tutor_profile_id: &str,
    rating: i64,
    content: &str,
) -> Result<Review, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = new_id();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO reviews (id, author_id, tutor_id, tutor_profile_id, rating, content, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&id)
    .bind(author_id)
    .bind(tutor_id)
    .bind(tutor_profile_id)
    .bind(rating)
    .bind(content)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(Review {
        id,
        author_id: author_id.to_string(),
        tutor_id: tutor_id.to_string(),
        tutor_profile_id: tutor_profile_id.to_string(),
        rating,
        content: content.to_string(),
        created_at: now,
    })
}

/// Average rating and number of reviews of a profile. The average is `None` without reviews.
pub async fn aggregate<'e, E>(db: E, tutor_profile_id: &str) -> Result<(Option<f64>, i64), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, (Option<f64>, i64)>(
        "SELECT AVG(rating), COUNT(rating) FROM reviews WHERE tutor_profile_id = ?",
    )
    .bind(tutor_profile_id)
    .fetch_one(db)
    .await
}

/// Newest first; `limit` of `None` returns every review.
pub async fn for_profile(
    db: &SqlitePool,
    tutor_profile_id: &str,
    limit: Option<i64>,
) -> Result<Vec<ReviewView>, sqlx::Error> {
    sqlx::query_as::<_, ReviewView>(
        r#"
        SELECT r.id, u.name AS author_name, r.rating, r.content, r.created_at
        FROM reviews r
        JOIN users u ON u.id = r.author_id
        WHERE r.tutor_profile_id = ?
        ORDER BY r.created_at DESC, r.rowid DESC
        LIMIT ?
        "#,
    )
    .bind(tutor_profile_id)
    .bind(limit.unwrap_or(-1))
    .fetch_all(db)
    .await
}
