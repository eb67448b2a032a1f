use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Accepted => "ACCEPTED",
            RequestStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LessonRequest {
    pub id: String,
    pub student_id: String,
    pub tutor_id: String,
    pub subject: String,
    pub message: String,
    pub status: RequestStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Body of a booking. The web surface fills `student_id` from the session and
/// `tutor_id` from the path; the mobile surface sends both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLessonRequest {
    pub student_id: Option<String>,
    pub tutor_id: Option<String>,
    pub subject: Option<String>,
    /// Mobile clients send the subject under this name.
    pub subjects: Option<String>,
    pub message: Option<String>,
}

/// A request joined with both parties, as listed on the "my requests" page.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LessonRequestView {
    pub id: String,
    pub student_id: String,
    pub tutor_id: String,
    pub subject: String,
    pub message: String,
    pub status: RequestStatus,
    pub created_at: String,
    pub updated_at: String,
    pub student_name: String,
    pub tutor_name: String,
    pub tutor_image: Option<String>,
    pub tutor_price: Option<i64>,
    pub chat_room_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestView {
    pub id: String,
    pub other_name: String,
    pub other_image: String,
    pub message: String,
    pub subject: String,
    pub created_at: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: String,
    pub subject: String,
    pub other_name: String,
    pub time: String,
    pub status: RequestStatus,
    pub date: String,
}
