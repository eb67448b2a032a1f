use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::db::{self, chats, users};
use crate::error::AppError;
use crate::models::{ChatDetails, ChatListRow, ChatRoom, ChatSummary, Message};

/// Rooms of `user_id`, newest activity first.
pub async fn rooms(db: &SqlitePool, user_id: &str) -> Result<Vec<ChatListRow>, AppError> {
    Ok(chats::list_rows(db, user_id).await?)
}

pub async fn summaries(db: &SqlitePool, user_id: &str) -> Result<Vec<ChatSummary>, AppError> {
    Ok(rooms(db, user_id)
        .await?
        .into_iter()
        .map(|row| ChatSummary::from_row(row, user_id))
        .collect())
}

/// A room as seen by one of its participants. Anyone else gets `NotFound`,
/// so room ids are not confirmed to outsiders.
async fn visible_room(db: &SqlitePool, room_id: &str, viewer: &str) -> Result<ChatRoom, AppError> {
    match chats::find_room(db, room_id).await? {
        Some(room) if room.has_participant(viewer) => Ok(room),
        _ => Err(AppError::NotFound),
    }
}

pub async fn details(db: &SqlitePool, room_id: &str, viewer: &str) -> Result<ChatDetails, AppError> {
    let room = visible_room(db, room_id, viewer).await?;

    let student = users::find_by_id(db, &room.student_id).await?.ok_or(AppError::NotFound)?;
    let tutor = users::find_by_id(db, &room.tutor_id).await?.ok_or(AppError::NotFound)?;
    let messages = chats::messages(db, &room.id, None).await?;

    let other_user_name = if viewer == room.student_id {
        tutor.name.clone()
    } else {
        student.name.clone()
    };

    Ok(ChatDetails {
        room,
        student_name: student.name,
        tutor_name: tutor.name,
        other_user_name,
        current_user_id: viewer.to_string(),
        messages,
    })
}

/// What a polling client asks for: messages newer than the last one it has.
pub async fn messages_since(
    db: &SqlitePool,
    room_id: &str,
    viewer: &str,
    since: Option<&str>,
) -> Result<Vec<Message>, AppError> {
    let room = visible_room(db, room_id, viewer).await?;

    let since = since
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|at| db::timestamp(at.with_timezone(&Utc)))
                .map_err(|e| AppError::BadRequest(format!("Invalid since timestamp: {}", e)))
        })
        .transpose()?;

    let messages = chats::messages(db, &room.id, since.as_deref()).await?;
    debug!("poll on room {} returned {} messages", room.id, messages.len());
    Ok(messages)
}

/// Messages of a room without the participant check; the mobile surface has no session.
pub async fn all_messages(db: &SqlitePool, room_id: &str) -> Result<Vec<Message>, AppError> {
    let room = chats::find_room(db, room_id).await?.ok_or(AppError::NotFound)?;
    Ok(chats::messages(db, &room.id, None).await?)
}

pub async fn send(
    db: &SqlitePool,
    room_id: &str,
    sender_id: &str,
    content: &str,
) -> Result<Message, AppError> {
    if content.trim().is_empty() {
        return Err(AppError::BadRequest("Message is empty".to_string()));
    }

    let room = chats::find_room(db, room_id).await?.ok_or(AppError::NotFound)?;
    if !room.has_participant(sender_id) {
        return Err(AppError::Forbidden("Not a participant of this chat".to_string()));
    }

    let mut tx = db.begin().await?;
    let message = chats::insert_message(&mut *tx, &room.id, sender_id, content).await?;
    chats::touch_room(&mut *tx, &room.id, &message.created_at).await?;
    tx.commit().await?;

    Ok(message)
}
