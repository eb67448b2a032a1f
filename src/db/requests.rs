use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

use crate::db::{new_id, now};
use crate::models::{LessonRequest, LessonRequestView, RequestStatus, Role};

const REQUEST_COLUMNS: &str = r#"
    id, student_id, tutor_id, subject, message, status, created_at, updated_at
"#;

/// Which timestamp a request listing is sorted by, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOrder {
    Created,
    Updated,
}

/// Filter for `list_views`. `side` picks whether `user_id` is matched as the
/// student or the tutor of the request.
#[derive(Debug, Clone)]
pub struct RequestFilter<'a> {
    pub side: Role,
    pub user_id: &'a str,
    pub status: Option<RequestStatus>,
    pub updated_since: Option<&'a str>,
    pub order: RequestOrder,
}

impl<'a> RequestFilter<'a> {
    pub fn new(side: Role, user_id: &'a str) -> Self {
        Self {
            side,
            user_id,
            status: None,
            updated_since: None,
            order: RequestOrder::Created,
        }
    }

    pub fn status(mut self, status: RequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn updated_since(mut self, since: &'a str) -> Self {
        self.updated_since = Some(since);
        self
    }

    pub fn order(mut self, order: RequestOrder) -> Self {
        self.order = order;
        self
    }

    fn push_where(&self, qb: &mut QueryBuilder<'a, Sqlite>) {
        qb.push(match self.side {
            Role::Student => " WHERE r.student_id = ",
            Role::Tutor => " WHERE r.tutor_id = ",
        });
        qb.push_bind(self.user_id);
        if let Some(status) = self.status {
            qb.push(" AND r.status = ");
            qb.push_bind(status);
        }
        if let Some(since) = self.updated_since {
            qb.push(" AND r.updated_at >= ");
            qb.push_bind(since);
        }
    }
}

pub async fn insert_request<'e, E>(
    db: E,
    student_id: &str,
    tutor_id: &str,
    subject: &str,
    message: &str,
) -> Result<LessonRequest, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = new_id();
    let now = now();
    let status = RequestStatus::Pending;

    sqlx::query(
        r#"
        INSERT INTO lesson_requests
            (id, student_id, tutor_id, subject, message, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
        "#,
    )
    .bind(&id)
    .bind(student_id)
    .bind(tutor_id)
    .bind(subject)
    .bind(message)
    .bind(status)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(LessonRequest {
        id,
        student_id: student_id.to_string(),
        tutor_id: tutor_id.to_string(),
        subject: subject.to_string(),
        message: message.to_string(),
        status,
        created_at: now.clone(),
        updated_at: now,
    })
}

pub async fn find_request<'e, E>(db: E, id: &str) -> Result<Option<LessonRequest>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, LessonRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM lesson_requests WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Moves a `PENDING` request to `status`. Returns `false` when the request was
/// no longer pending, so two concurrent decisions cannot both win.
pub async fn decide<'e, E>(db: E, id: &str, status: RequestStatus) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE lesson_requests
        SET status = ?1,
            updated_at = ?2
        WHERE id = ?3 AND status = 'PENDING'
        "#,
    )
    .bind(status)
    .bind(now())
    .bind(id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_views(
    db: &SqlitePool,
    filter: &RequestFilter<'_>,
) -> Result<Vec<LessonRequestView>, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT
            r.id,
            r.student_id,
            r.tutor_id,
            r.subject,
            r.message,
            r.status,
            r.created_at,
            r.updated_at,
            s.name AS student_name,
            t.name AS tutor_name,
            p.image_url AS tutor_image,
            p.price AS tutor_price,
            c.id AS chat_room_id
        FROM lesson_requests r
        JOIN users s ON s.id = r.student_id
        JOIN users t ON t.id = r.tutor_id
        LEFT JOIN tutor_profiles p ON p.user_id = r.tutor_id
        LEFT JOIN chat_rooms c ON c.request_id = r.id
        "#,
    );
    filter.push_where(&mut qb);
    qb.push(match filter.order {
        RequestOrder::Created => " ORDER BY r.created_at DESC, r.rowid DESC",
        RequestOrder::Updated => " ORDER BY r.updated_at DESC, r.rowid DESC",
    });

    qb.build_query_as::<LessonRequestView>().fetch_all(db).await
}

pub async fn count(db: &SqlitePool, filter: &RequestFilter<'_>) -> Result<i64, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM lesson_requests r");
    filter.push_where(&mut qb);
    qb.build_query_scalar::<i64>().fetch_one(db).await
}
