//! JSON endpoints for the mobile client. There is no cookie here: callers name
//! the acting user with `userId` / `senderId` / `studentId`.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::AppError;
use crate::models::{
    LessonRequest, LoginRequest, Message, NewLessonRequest, OnboardingRequest, PublicUser,
    RegisterRequest, Role, SendMessageRequest, TutorCard, TutorDetail, TutorSearch,
};
use crate::services::{auth, booking, chat, tutors};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/onboarding", post(complete_onboarding))
        .route("/my", get(my_overview))
        .route("/chat", get(chat_rooms))
        .route("/chat/{id}", get(room_messages).post(send_message))
        .route("/tutors", get(search_tutors))
        .route("/tutors/{id}", get(tutor_detail))
        .route("/requests", post(create_request))
}

#[derive(Debug, Default, Deserialize)]
struct UserQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

impl UserQuery {
    fn require(self) -> Result<String, AppError> {
        self.user_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing user ID".to_string()))
    }
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let user = auth::register(&state.db, req).await?;
    Ok(Json(user.into()))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let user = auth::login(&state.db, req).await?;
    Ok(Json(user.into()))
}

async fn complete_onboarding(
    State(state): State<AppState>,
    Json(req): Json<OnboardingRequest>,
) -> Result<Json<Value>, AppError> {
    let user_id = UserQuery { user_id: req.user_id }.require()?;
    let user = auth::complete_onboarding(&state.db, &user_id, &req.answers).await?;
    Ok(Json(json!({ "success": true, "isOnboarded": user.is_onboarded })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestSummary {
    id: String,
    tutor_name: String,
    status: crate::models::RequestStatus,
    subject: String,
    date: String,
}

#[derive(Debug, Serialize)]
struct MyOverview {
    requests: Vec<RequestSummary>,
    schedules: Vec<Value>,
}

async fn my_overview(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<MyOverview>, AppError> {
    let user_id = query.require()?;
    let views = booking::requests_of(&state.db, Role::Student, &user_id).await?;

    let requests = views
        .into_iter()
        .map(|r| RequestSummary {
            id: r.id,
            tutor_name: r.tutor_name,
            status: r.status,
            subject: r.subject,
            date: r.created_at,
        })
        .collect();

    Ok(Json(MyOverview {
        requests,
        schedules: Vec::new(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MobileChatSummary {
    id: String,
    other_user_name: String,
    last_message: String,
    updated_at: String,
}

async fn chat_rooms(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<MobileChatSummary>>, AppError> {
    let user_id = query.require()?;
    let rooms = chat::rooms(&state.db, &user_id).await?;

    Ok(Json(
        rooms
            .into_iter()
            .map(|row| MobileChatSummary {
                other_user_name: row.other_name(&user_id).to_string(),
                last_message: row
                    .last_message
                    .unwrap_or_else(|| "대화가 없습니다.".to_string()),
                updated_at: row.updated_at,
                id: row.id,
            })
            .collect(),
    ))
}

async fn room_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(chat::all_messages(&state.db, &id).await?))
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Message>, AppError> {
    let sender_id = UserQuery { user_id: req.sender_id }.require()?;
    Ok(Json(chat::send(&state.db, &id, &sender_id, &req.content).await?))
}

async fn search_tutors(
    State(state): State<AppState>,
    Query(search): Query<TutorSearch>,
) -> Result<Json<Vec<TutorCard>>, AppError> {
    Ok(Json(tutors::search(&state.db, &search).await?))
}

async fn tutor_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<TutorDetail>, AppError> {
    let detail = tutors::detail(
        &state.db,
        &id,
        query.user_id.as_deref(),
        Some(tutors::MOBILE_REVIEW_LIMIT),
    )
    .await?;
    Ok(Json(detail))
}

async fn create_request(
    State(state): State<AppState>,
    Json(req): Json<NewLessonRequest>,
) -> Result<Json<LessonRequest>, AppError> {
    let (Some(student_id), Some(tutor_id)) = (req.student_id.as_deref(), req.tutor_id.as_deref())
    else {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    };

    let subject = req.subjects.as_deref().or(req.subject.as_deref());
    let request = booking::create_request_with_room(
        &state.db,
        student_id,
        tutor_id,
        subject,
        req.message.as_deref(),
    )
    .await?;
    Ok(Json(request))
}
