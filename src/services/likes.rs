use sqlx::SqlitePool;
use tracing::debug;

use crate::db::{likes, tutors};
use crate::error::AppError;
use crate::services::auth::unknown_session_user;

/// Likes the tutor, or removes the like when there already is one. Returns
/// whether the tutor is liked afterwards.
pub async fn toggle_like(db: &SqlitePool, student_id: &str, tutor_user_id: &str) -> Result<bool, AppError> {
    let profile = tutors::find_profile_by_user(db, tutor_user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let liked = match likes::find_like(db, student_id, tutor_user_id).await? {
        Some(id) => {
            likes::delete_like(db, &id).await?;
            false
        }
        None => {
            likes::insert_like(db, student_id, tutor_user_id, &profile.id)
                .await
                .map_err(unknown_session_user)?;
            true
        }
    };

    debug!("{} {} tutor {}", student_id, if liked { "liked" } else { "unliked" }, tutor_user_id);
    Ok(liked)
}

pub async fn is_liked(db: &SqlitePool, student_id: &str, tutor_user_id: &str) -> Result<bool, AppError> {
    Ok(likes::find_like(db, student_id, tutor_user_id).await?.is_some())
}
