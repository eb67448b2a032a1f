use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::request::RequestStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub id: String,
    pub request_id: String,
    pub student_id: String,
    pub tutor_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ChatRoom {
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.student_id == user_id || self.tutor_id == user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub chat_room_id: String,
    pub sender_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
}

/// A room joined with both parties, its request and its latest message.
#[derive(Debug, Clone, FromRow)]
pub struct ChatListRow {
    pub id: String,
    pub request_id: String,
    pub student_id: String,
    pub tutor_id: String,
    pub student_name: String,
    pub tutor_name: String,
    pub tutor_image: Option<String>,
    pub status: RequestStatus,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ChatListRow {
    pub fn is_student(&self, viewer: &str) -> bool {
        self.student_id == viewer
    }

    pub fn other_name(&self, viewer: &str) -> &str {
        if self.is_student(viewer) {
            &self.tutor_name
        } else {
            &self.student_name
        }
    }
}

/// One row of a chat list, seen from the viewer's side of the room.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: String,
    pub other_name: String,
    pub other_image: String,
    pub last_message: String,
    pub updated_at: String,
    pub request_id: String,
    pub status: RequestStatus,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ChatSummary {
    pub fn from_row(row: ChatListRow, viewer: &str) -> Self {
        let other_image = if row.is_student(viewer) {
            row.tutor_image.clone().unwrap_or_default()
        } else {
            String::new()
        };
        Self {
            other_name: row.other_name(viewer).to_string(),
            other_image,
            last_message: row
                .last_message
                .unwrap_or_else(|| "No messages yet".to_string()),
            updated_at: row.last_message_at.unwrap_or(row.created_at),
            id: row.id,
            request_id: row.request_id,
            status: row.status,
            kind: "chat",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDetails {
    #[serde(flatten)]
    pub room: ChatRoom,
    pub student_name: String,
    pub tutor_name: String,
    pub other_user_name: String,
    pub current_user_id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Only read by the mobile surface.
    pub sender_id: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesSinceQuery {
    pub since: Option<String>,
}
