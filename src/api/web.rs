//! The cookie-session surface used by the web pages.

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::extract::multipart::MultipartError;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::MAX_UPLOAD_BYTES;
use crate::db::{tutors as tutor_repo, users};
use crate::error::AppError;
use crate::models::*;
use crate::services::profile::{ImageUpload, ProfileForm};
use crate::services::{auth, booking, chat, dashboard, likes, profile, reviews, tutors};
use crate::session::Session;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/onboarding", post(complete_onboarding))
        .route("/tutors", get(search_tutors))
        .route("/tutors/{id}", get(tutor_detail))
        .route("/tutors/{id}/reviews", post(create_review))
        .route("/tutors/{id}/like", post(toggle_like))
        .route("/tutors/{id}/requests", post(create_request))
        .route("/tags/popular", get(popular_tags))
        .route("/requests", get(my_requests))
        .route("/requests/pending", get(pending_requests))
        .route("/requests/{id}/accept", post(accept_request))
        .route("/requests/{id}/reject", post(reject_request))
        .route("/chats", get(ongoing_chats))
        .route("/chats/{id}", get(chat_details))
        .route("/chats/{id}/messages", get(poll_messages).post(send_message))
        .route("/me", get(me))
        .route(
            "/me/profile",
            get(my_profile)
                .put(update_profile)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/me/schedule", get(schedule))
        .route("/me/settlement", get(settlement))
        .route("/me/dashboard", get(dashboard_stats))
        .route("/me/likes", get(liked_tutors))
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    user: PublicUser,
    redirect: &'static str,
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let user = auth::register(&state.db, req).await?;
    let redirect = auth::register_redirect(&user);
    let jar = Session::start(jar, &user);
    Ok((jar, Json(AuthResponse { user: user.into(), redirect })))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let user = auth::login(&state.db, req).await?;
    let redirect = auth::login_redirect(&user);
    let jar = Session::start(jar, &user);
    Ok((jar, Json(AuthResponse { user: user.into(), redirect })))
}

async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    (Session::end(jar), Json(json!({ "redirect": "/login" })))
}

async fn complete_onboarding(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<OnboardingRequest>,
) -> Result<Json<Value>, AppError> {
    let user = auth::complete_onboarding(&state.db, &session.user_id, &req.answers).await?;
    Ok(Json(json!({ "user": user, "redirect": "/" })))
}

async fn search_tutors(
    State(state): State<AppState>,
    Query(search): Query<TutorSearch>,
) -> Result<Json<Vec<TutorCard>>, AppError> {
    Ok(Json(tutors::search(&state.db, &search).await?))
}

async fn tutor_detail(
    State(state): State<AppState>,
    session: Option<Session>,
    Path(id): Path<String>,
) -> Result<Json<TutorDetail>, AppError> {
    let viewer = session.as_ref().map(|s| s.user_id.as_str());
    Ok(Json(tutors::detail(&state.db, &id, viewer, None).await?))
}

async fn create_review(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(req): Json<NewReviewRequest>,
) -> Result<Json<RatingSummary>, AppError> {
    Ok(Json(reviews::create_review(&state.db, &session.user_id, &id, req).await?))
}

async fn toggle_like(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<LikeToggled>, AppError> {
    let is_liked = likes::toggle_like(&state.db, &session.user_id, &id).await?;
    Ok(Json(LikeToggled { success: true, is_liked }))
}

#[derive(Debug, Default, Deserialize)]
struct BookingForm {
    subject: Option<String>,
    message: Option<String>,
}

async fn create_request(
    State(state): State<AppState>,
    session: Session,
    Path(tutor_id): Path<String>,
    Json(form): Json<BookingForm>,
) -> Result<Json<LessonRequest>, AppError> {
    let request = booking::create_request(
        &state.db,
        &session.user_id,
        &tutor_id,
        form.subject.as_deref(),
        form.message.as_deref(),
    )
    .await?;
    Ok(Json(request))
}

async fn popular_tags(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(tutors::popular_tags(&state.db).await?))
}

async fn my_requests(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<LessonRequestView>>, AppError> {
    Ok(Json(booking::my_requests(&state.db, &session).await?))
}

async fn pending_requests(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<PendingRequestView>>, AppError> {
    Ok(Json(booking::pending_requests(&state.db, &session).await?))
}

async fn accept_request(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let room = booking::accept(&state.db, &id, &session.user_id).await?;
    Ok(Json(json!({ "success": true, "chatRoomId": room.id })))
}

async fn reject_request(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    booking::reject(&state.db, &id, &session.user_id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn ongoing_chats(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<ChatSummary>>, AppError> {
    Ok(Json(chat::summaries(&state.db, &session.user_id).await?))
}

async fn chat_details(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<ChatDetails>, AppError> {
    Ok(Json(chat::details(&state.db, &id, &session.user_id).await?))
}

async fn poll_messages(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Query(query): Query<MessagesSinceQuery>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages =
        chat::messages_since(&state.db, &id, &session.user_id, query.since.as_deref()).await?;
    Ok(Json(messages))
}

async fn send_message(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Message>, AppError> {
    Ok(Json(chat::send(&state.db, &id, &session.user_id, &req.content).await?))
}

async fn me(State(state): State<AppState>, session: Session) -> Result<Json<PublicUser>, AppError> {
    let user = users::find_by_id(&state.db, &session.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user.into()))
}

async fn my_profile(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<TutorProfile>, AppError> {
    let profile = tutor_repo::find_profile_by_user(&state.db, &session.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(profile))
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed form data: {}", e))
}

async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Json<TutorProfile>, AppError> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                form.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "bio" => form.bio = field.text().await.map_err(bad_multipart)?,
            "university" => form.university = field.text().await.map_err(bad_multipart)?,
            "major" => form.major = field.text().await.map_err(bad_multipart)?,
            "price" => form.price = Some(field.text().await.map_err(bad_multipart)?),
            _ => {}
        }
    }

    let profile =
        profile::update_profile(&state.db, state.images.as_ref(), &session.user_id, form).await?;
    Ok(Json(profile))
}

async fn schedule(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    Ok(Json(booking::schedule(&state.db, &session).await?))
}

async fn settlement(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Settlement>, AppError> {
    Ok(Json(dashboard::settlement(&state.db, &session.user_id).await?))
}

async fn dashboard_stats(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<DashboardStats>, AppError> {
    let stats = dashboard::stats(&state.db, &session.user_id, chrono::Utc::now()).await?;
    Ok(Json(stats))
}

async fn liked_tutors(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<TutorCard>>, AppError> {
    Ok(Json(tutors::liked_tutors(&state.db, &session.user_id).await?))
}
