use sqlx::{SqliteExecutor, SqlitePool};

use crate::db::{new_id, now};
use crate::models::{ChatListRow, ChatRoom, Message};

const ROOM_COLUMNS: &str = "id, request_id, student_id, tutor_id, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, chat_room_id, sender_id, content, is_read, created_at";

pub async fn find_room<'e, E>(db: E, id: &str) -> Result<Option<ChatRoom>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, ChatRoom>(&format!("SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_room_for_request<'e, E>(
    db: E,
    request_id: &str,
) -> Result<Option<ChatRoom>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, ChatRoom>(&format!(
        "SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE request_id = ?"
    ))
    .bind(request_id)
    .fetch_optional(db)
    .await
}

pub async fn find_room_for_pair<'e, E>(
    db: E,
    student_id: &str,
    tutor_id: &str,
) -> Result<Option<ChatRoom>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, ChatRoom>(&format!(
        "SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE student_id = ? AND tutor_id = ? LIMIT 1"
    ))
    .bind(student_id)
    .bind(tutor_id)
    .fetch_optional(db)
    .await
}

pub async fn insert_room<'e, E>(
    db: E,
    request_id: &str,
    student_id: &str,
    tutor_id: &str,
) -> Result<ChatRoom, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = new_id();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO chat_rooms (id, request_id, student_id, tutor_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        "#,
    )
    .bind(&id)
    .bind(request_id)
    .bind(student_id)
    .bind(tutor_id)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(ChatRoom {
        id,
        request_id: request_id.to_string(),
        student_id: student_id.to_string(),
        tutor_id: tutor_id.to_string(),
        created_at: now.clone(),
        updated_at: now,
    })
}

pub async fn touch_room<'e, E>(db: E, id: &str, at: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE chat_rooms SET updated_at = ? WHERE id = ?")
        .bind(at)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Every room `user_id` takes part in, most recently active first.
pub async fn list_rows(db: &SqlitePool, user_id: &str) -> Result<Vec<ChatListRow>, sqlx::Error> {
    sqlx::query_as::<_, ChatListRow>(
        r#"
        SELECT
            c.id,
            c.request_id,
            c.student_id,
            c.tutor_id,
            s.name AS student_name,
            t.name AS tutor_name,
            p.image_url AS tutor_image,
            r.status,
            (
                SELECT m.content FROM messages m
                WHERE m.chat_room_id = c.id
                ORDER BY m.created_at DESC, m.rowid DESC
                LIMIT 1
            ) AS last_message,
            (
                SELECT m.created_at FROM messages m
                WHERE m.chat_room_id = c.id
                ORDER BY m.created_at DESC, m.rowid DESC
                LIMIT 1
            ) AS last_message_at,
            c.created_at,
            c.updated_at
        FROM chat_rooms c
        JOIN users s ON s.id = c.student_id
        JOIN users t ON t.id = c.tutor_id
        JOIN lesson_requests r ON r.id = c.request_id
        LEFT JOIN tutor_profiles p ON p.user_id = c.tutor_id
        WHERE c.student_id = ? OR c.tutor_id = ?
        ORDER BY c.updated_at DESC, c.rowid DESC
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Messages of a room in send order. With `since`, only those strictly newer.
pub async fn messages(
    db: &SqlitePool,
    room_id: &str,
    since: Option<&str>,
) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS} FROM messages
        WHERE chat_room_id = ?1 AND (?2 IS NULL OR created_at > ?2)
        ORDER BY created_at ASC, rowid ASC
        "#
    ))
    .bind(room_id)
    .bind(since)
    .fetch_all(db)
    .await
}

pub async fn insert_message<'e, E>(
    db: E,
    room_id: &str,
    sender_id: &str,
    content: &str,
) -> Result<Message, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = new_id();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO messages (id, chat_room_id, sender_id, content, is_read, created_at)
        VALUES (?1, ?2, ?3, ?4, 0, ?5)
        "#,
    )
    .bind(&id)
    .bind(room_id)
    .bind(sender_id)
    .bind(content)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(Message {
        id,
        chat_room_id: room_id.to_string(),
        sender_id: sender_id.to_string(),
        content: content.to_string(),
        is_read: false,
        created_at: now,
    })
}
