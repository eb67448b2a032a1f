use sqlx::SqlitePool;
use tracing::info;

use crate::db::{reviews, tutors};
use crate::error::AppError;
use crate::services::auth::unknown_session_user;
use crate::models::{NewReviewRequest, RatingSummary};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Stores the review and recomputes the tutor's average and count in the same transaction.
pub async fn create_review(
    db: &SqlitePool,
    author_id: &str,
    tutor_user_id: &str,
    req: NewReviewRequest,
) -> Result<RatingSummary, AppError> {
    if !(MIN_RATING..=MAX_RATING).contains(&req.rating) {
        return Err(AppError::BadRequest(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    if author_id == tutor_user_id {
        return Err(AppError::BadRequest("Cannot review yourself".to_string()));
    }

    let mut tx = db.begin().await?;

    let profile = tutors::find_profile_by_user(&mut *tx, tutor_user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    reviews::insert_review(
        &mut *tx,
        author_id,
        tutor_user_id,
        &profile.id,
        req.rating,
        req.content.trim(),
    )
    .await
    .map_err(unknown_session_user)?;

    let (average, count) = reviews::aggregate(&mut *tx, &profile.id).await?;
    let rating = average.unwrap_or(0.0);
    tutors::set_rating(&mut *tx, &profile.id, rating, count).await?;

    tx.commit().await?;

    info!("tutor {} now rated {:.2} over {} reviews", tutor_user_id, rating, count);
    Ok(RatingSummary {
        success: true,
        rating,
        review_count: count,
    })
}
