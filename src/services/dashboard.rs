//! Tutor-side money and activity numbers. One accepted request counts as one paid lesson.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::db::requests::{self, RequestFilter, RequestOrder};
use crate::db::{self, tutors, users};
use crate::error::AppError;
use crate::models::{DashboardStats, RequestStatus, Role, Settlement, SettlementEntry};

pub async fn settlement(db: &SqlitePool, user_id: &str) -> Result<Settlement, AppError> {
    let Some(user) = users::find_by_id(db, user_id).await? else {
        return Ok(Settlement::default());
    };
    if user.role != Role::Tutor {
        return Ok(Settlement::default());
    }
    let Some(profile) = tutors::find_profile_by_user(db, user_id).await? else {
        return Ok(Settlement::default());
    };

    let filter = RequestFilter::new(Role::Tutor, user_id)
        .status(RequestStatus::Accepted)
        .order(RequestOrder::Updated);
    let accepted = requests::list_views(db, &filter).await?;

    let history: Vec<SettlementEntry> = accepted
        .into_iter()
        .map(|r| SettlementEntry {
            id: r.id,
            title: format!("{} 학생 수업료", r.student_name),
            date: r.updated_at,
            amount: profile.price,
        })
        .collect();

    Ok(Settlement {
        total_amount: history.len() as i64 * profile.price,
        history,
    })
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}

fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .unwrap_or_else(|| now.date_naive())
        .and_time(chrono::NaiveTime::MIN)
        .and_utc()
}

/// Dashboard counters relative to `now` (UTC calendar days and months).
pub async fn stats(db: &SqlitePool, user_id: &str, now: DateTime<Utc>) -> Result<DashboardStats, AppError> {
    let day_start = db::timestamp(start_of_day(now));
    let month_start = db::timestamp(start_of_month(now));

    let today = RequestFilter::new(Role::Tutor, user_id)
        .status(RequestStatus::Accepted)
        .updated_since(&day_start);
    let this_month = RequestFilter::new(Role::Tutor, user_id)
        .status(RequestStatus::Accepted)
        .updated_since(&month_start);
    let pending = RequestFilter::new(Role::Tutor, user_id).status(RequestStatus::Pending);

    let (today_class_count, monthly_count, new_requests_count, profile) = tokio::try_join!(
        requests::count(db, &today),
        requests::count(db, &this_month),
        requests::count(db, &pending),
        tutors::find_profile_by_user(db, user_id),
    )?;

    let price = profile.map(|p| p.price).unwrap_or(0);
    Ok(DashboardStats {
        today_class_count,
        monthly_income: monthly_count * price,
        new_requests_count,
    })
}
