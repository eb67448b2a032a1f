use sqlx::SqlitePool;

use crate::db::{reviews, tutors};
use crate::error::AppError;
use crate::models::{TutorCard, TutorDetail, TutorRow, TutorSearch};
use crate::services::likes;

pub const POPULAR_TAG_LIMIT: i64 = 8;
/// The mobile detail endpoint only ships the latest few reviews.
pub const MOBILE_REVIEW_LIMIT: i64 = 5;

async fn into_cards(db: &SqlitePool, rows: Vec<TutorRow>) -> Result<Vec<TutorCard>, AppError> {
    let profile_ids: Vec<&str> = rows.iter().filter_map(|r| r.profile_id.as_deref()).collect();
    let mut tags = tutors::tags_for(db, &profile_ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let row_tags = row
                .profile_id
                .as_ref()
                .and_then(|id| tags.remove(id))
                .unwrap_or_default();
            TutorCard::from_row(row, row_tags)
        })
        .collect())
}

pub async fn search(db: &SqlitePool, search: &TutorSearch) -> Result<Vec<TutorCard>, AppError> {
    let rows = tutors::search(db, search).await?;
    into_cards(db, rows).await
}

/// A tutor's page. `viewer` decides `isLiked`; `review_limit` of `None` includes every review.
pub async fn detail(
    db: &SqlitePool,
    tutor_id: &str,
    viewer: Option<&str>,
    review_limit: Option<i64>,
) -> Result<TutorDetail, AppError> {
    let row = tutors::find_tutor(db, tutor_id).await?.ok_or(AppError::NotFound)?;

    let (tags, reviews) = match row.profile_id.as_deref() {
        Some(profile_id) => {
            let tags = tutors::tags_for(db, &[profile_id])
                .await?
                .remove(profile_id)
                .unwrap_or_default();
            let reviews = reviews::for_profile(db, profile_id, review_limit).await?;
            (tags, reviews)
        }
        None => (Vec::new(), Vec::new()),
    };

    let is_liked = match viewer {
        Some(viewer) => likes::is_liked(db, viewer, tutor_id).await?,
        None => false,
    };

    Ok(TutorDetail::from_row(row, tags, reviews, is_liked))
}

pub async fn liked_tutors(db: &SqlitePool, student_id: &str) -> Result<Vec<TutorCard>, AppError> {
    let rows = tutors::liked_by(db, student_id).await?;
    let mut cards = into_cards(db, rows).await?;
    for card in &mut cards {
        if card.university.is_empty() {
            card.university = "Unknown".to_string();
        }
        if card.major.is_empty() {
            card.major = "Unknown".to_string();
        }
    }
    Ok(cards)
}

pub async fn popular_tags(db: &SqlitePool) -> Result<Vec<String>, AppError> {
    Ok(tutors::popular_tags(db, POPULAR_TAG_LIMIT).await?)
}
