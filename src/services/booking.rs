//! The lesson request lifecycle: `PENDING` to `ACCEPTED` or `REJECTED`, with
//! acceptance opening the request's chat room.

use sqlx::SqlitePool;
use tracing::info;

use crate::db::requests::{self, RequestFilter, RequestOrder};
use crate::db::{chats, users};
use crate::error::AppError;
use crate::models::{
    ChatRoom, LessonRequest, LessonRequestView, PendingRequestView, RequestStatus, Role,
    ScheduleEntry,
};
use crate::services::auth::unknown_session_user;
use crate::session::Session;

pub const DEFAULT_SUBJECT: &str = "영어";
pub const DEFAULT_MESSAGE: &str = "과외 요청합니다.";
pub const UNSCHEDULED: &str = "시간 미정";

/// First message the tutor "sends" when a request is accepted.
pub fn greeting(subject: &str) -> String {
    format!(
        "안녕하세요! '{}' 수업 요청해주셔서 감사합니다. 언제 시범 수업을 진행하면 좋을까요?",
        subject
    )
}

fn or_default(value: Option<&str>, default: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

async fn ensure_tutor(db: &SqlitePool, tutor_id: &str) -> Result<(), AppError> {
    match users::find_by_id(db, tutor_id).await? {
        Some(user) if user.role == Role::Tutor => Ok(()),
        _ => Err(AppError::NotFound),
    }
}

pub async fn create_request(
    db: &SqlitePool,
    student_id: &str,
    tutor_id: &str,
    subject: Option<&str>,
    message: Option<&str>,
) -> Result<LessonRequest, AppError> {
    if student_id == tutor_id {
        return Err(AppError::BadRequest("Cannot request a lesson from yourself".to_string()));
    }
    ensure_tutor(db, tutor_id).await?;

    let subject = or_default(subject, DEFAULT_SUBJECT);
    let message = or_default(message, DEFAULT_MESSAGE);
    let request = requests::insert_request(db, student_id, tutor_id, &subject, &message)
        .await
        .map_err(unknown_session_user)?;

    info!("lesson request {} created ({} -> {})", request.id, student_id, tutor_id);
    Ok(request)
}

/// Booking as the mobile client does it: the request plus, when the pair has
/// no room yet, a chat room tied to this request.
pub async fn create_request_with_room(
    db: &SqlitePool,
    student_id: &str,
    tutor_id: &str,
    subject: Option<&str>,
    message: Option<&str>,
) -> Result<LessonRequest, AppError> {
    if student_id == tutor_id {
        return Err(AppError::BadRequest("Cannot request a lesson from yourself".to_string()));
    }
    ensure_tutor(db, tutor_id).await?;
    if users::find_by_id(db, student_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let subject = or_default(subject, DEFAULT_SUBJECT);
    let message = or_default(message, DEFAULT_MESSAGE);

    let mut tx = db.begin().await?;
    let request = requests::insert_request(&mut *tx, student_id, tutor_id, &subject, &message).await?;
    if chats::find_room_for_pair(&mut *tx, student_id, tutor_id).await?.is_none() {
        let room = chats::insert_room(&mut *tx, &request.id, student_id, tutor_id).await?;
        info!("chat room {} opened for request {}", room.id, request.id);
    }
    tx.commit().await?;

    Ok(request)
}

/// Accepts a pending request on behalf of its tutor. Exactly one chat room
/// exists for the request afterwards; a fresh room starts with the greeting.
pub async fn accept(db: &SqlitePool, request_id: &str, actor_id: &str) -> Result<ChatRoom, AppError> {
    let request = requests::find_request(db, request_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if request.tutor_id != actor_id {
        return Err(AppError::Forbidden("Only the requested tutor can accept".to_string()));
    }

    // The guarded update has to be the first statement so the transaction
    // holds the write lock before it reads anything.
    let mut tx = db.begin().await?;
    if !requests::decide(&mut *tx, request_id, RequestStatus::Accepted).await? {
        return Err(AppError::Conflict("Request is no longer pending".to_string()));
    }

    let room = match chats::find_room_for_request(&mut *tx, request_id).await? {
        Some(room) => room,
        None => {
            let room =
                chats::insert_room(&mut *tx, &request.id, &request.student_id, &request.tutor_id)
                    .await?;
            chats::insert_message(&mut *tx, &room.id, &request.tutor_id, &greeting(&request.subject))
                .await?;
            room
        }
    };

    tx.commit().await?;
    info!("request {} accepted, chat room {}", request_id, room.id);
    Ok(room)
}

pub async fn reject(db: &SqlitePool, request_id: &str, actor_id: &str) -> Result<(), AppError> {
    let request = requests::find_request(db, request_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if request.tutor_id != actor_id {
        return Err(AppError::Forbidden("Only the requested tutor can reject".to_string()));
    }
    if !requests::decide(db, request_id, RequestStatus::Rejected).await? {
        return Err(AppError::Conflict(format!("Request is already {}", request.status)));
    }

    info!("request {} rejected", request_id);
    Ok(())
}

/// Every request `user_id` is a party to on the `side` given, newest first.
pub async fn requests_of(
    db: &SqlitePool,
    side: Role,
    user_id: &str,
) -> Result<Vec<LessonRequestView>, AppError> {
    let filter = RequestFilter::new(side, user_id);
    Ok(requests::list_views(db, &filter).await?)
}

/// Every request the session user is a party to, from their side.
pub async fn my_requests(db: &SqlitePool, session: &Session) -> Result<Vec<LessonRequestView>, AppError> {
    requests_of(db, session.role, &session.user_id).await
}

/// Students see their waitlist, tutors their incoming requests.
pub async fn pending_requests(
    db: &SqlitePool,
    session: &Session,
) -> Result<Vec<PendingRequestView>, AppError> {
    let filter = RequestFilter::new(session.role, &session.user_id).status(RequestStatus::Pending);
    let views = requests::list_views(db, &filter).await?;

    Ok(views
        .into_iter()
        .map(|r| {
            let (other_name, other_image) = if session.is_tutor() {
                (r.student_name, String::new())
            } else {
                (r.tutor_name, r.tutor_image.unwrap_or_default())
            };
            PendingRequestView {
                id: r.id,
                other_name,
                other_image,
                message: r.message,
                subject: r.subject,
                created_at: r.created_at,
                kind: "request",
            }
        })
        .collect())
}

pub async fn schedule(db: &SqlitePool, session: &Session) -> Result<Vec<ScheduleEntry>, AppError> {
    let filter = RequestFilter::new(session.role, &session.user_id)
        .status(RequestStatus::Accepted)
        .order(RequestOrder::Updated);
    let views = requests::list_views(db, &filter).await?;

    Ok(views
        .into_iter()
        .map(|r| ScheduleEntry {
            other_name: if session.is_tutor() { r.student_name } else { r.tutor_name },
            id: r.id,
            subject: r.subject,
            time: UNSCHEDULED.to_string(),
            status: r.status,
            date: r.updated_at,
        })
        .collect())
}
