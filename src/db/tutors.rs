use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};

use crate::db::{like_pattern, new_id, now};
use crate::models::{ProfileUpdate, SortOrder, TutorProfile, TutorRow, TutorSearch};

const TUTOR_ROW_SELECT: &str = r#"
    SELECT
        u.id,
        u.name,
        p.id AS profile_id,
        p.university,
        p.major,
        p.bio,
        p.price,
        p.rating,
        p.review_count,
        p.image_url,
        p.education,
        p.locations,
        p.pricing_details,
        u.created_at
    FROM users u
    LEFT JOIN tutor_profiles p ON p.user_id = u.id
"#;

const PROFILE_COLUMNS: &str = r#"
    id, user_id, bio, university, major, price, rating, review_count, image_url,
    education, locations, pricing_details, created_at, updated_at
"#;

/// Fields a new profile starts with; rating and review count always start at zero.
#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub bio: String,
    pub university: String,
    pub major: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub education: Option<String>,
    pub locations: Option<String>,
    pub pricing_details: Option<String>,
}

pub async fn search(db: &SqlitePool, search: &TutorSearch) -> Result<Vec<TutorRow>, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(TUTOR_ROW_SELECT);
    qb.push(" WHERE u.role = 'tutor'");

    if let Some(q) = search.query() {
        let pattern = like_pattern(q);
        qb.push(" AND (u.name LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" ESCAPE '\\' OR p.university LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" ESCAPE '\\' OR p.major LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" ESCAPE '\\' OR p.bio LIKE ");
        qb.push_bind(pattern);
        qb.push(" ESCAPE '\\')");
    }

    let tags = search.tag_list();
    if !tags.is_empty() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM tutor_tags tt JOIN tags t ON t.id = tt.tag_id \
             WHERE tt.tutor_profile_id = p.id AND t.name IN (",
        );
        let mut names = qb.separated(", ");
        for tag in tags {
            names.push_bind(tag);
        }
        names.push_unseparated("))");
    }

    if let Some((min, max)) = search.price_range() {
        qb.push(" AND p.price BETWEEN ");
        qb.push_bind(min);
        qb.push(" AND ");
        qb.push_bind(max);
    }

    qb.push(match search.sort {
        Some(SortOrder::Rating) => " ORDER BY COALESCE(p.rating, 0) DESC, u.created_at ASC, u.rowid ASC",
        Some(SortOrder::Newest) => " ORDER BY u.created_at DESC, u.rowid DESC",
        None => " ORDER BY u.created_at ASC, u.rowid ASC",
    });

    qb.build_query_as::<TutorRow>().fetch_all(db).await
}

pub async fn find_tutor(db: &SqlitePool, user_id: &str) -> Result<Option<TutorRow>, sqlx::Error> {
    sqlx::query_as::<_, TutorRow>(&format!(
        "{TUTOR_ROW_SELECT} WHERE u.role = 'tutor' AND u.id = ?"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Tutor rows for everything `student_id` has liked, most recent like first.
pub async fn liked_by(db: &SqlitePool, student_id: &str) -> Result<Vec<TutorRow>, sqlx::Error> {
    sqlx::query_as::<_, TutorRow>(&format!(
        "{TUTOR_ROW_SELECT} JOIN likes l ON l.tutor_id = u.id \
         WHERE l.student_id = ? ORDER BY l.created_at DESC, l.rowid DESC"
    ))
    .bind(student_id)
    .fetch_all(db)
    .await
}

/// Tag names keyed by profile id.
pub async fn tags_for(
    db: &SqlitePool,
    profile_ids: &[&str],
) -> Result<HashMap<String, Vec<String>>, sqlx::Error> {
    let mut tags: HashMap<String, Vec<String>> = HashMap::new();
    if profile_ids.is_empty() {
        return Ok(tags);
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT tt.tutor_profile_id, t.name FROM tutor_tags tt \
         JOIN tags t ON t.id = tt.tag_id WHERE tt.tutor_profile_id IN (",
    );
    let mut ids = qb.separated(", ");
    for id in profile_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY t.name");

    let rows: Vec<(String, String)> = qb.build_query_as().fetch_all(db).await?;
    for (profile_id, name) in rows {
        tags.entry(profile_id).or_default().push(name);
    }
    Ok(tags)
}

pub async fn find_profile_by_user<'e, E>(
    db: E,
    user_id: &str,
) -> Result<Option<TutorProfile>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, TutorProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM tutor_profiles WHERE user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn insert_profile<'e, E>(
    db: E,
    user_id: &str,
    profile: &NewProfile,
) -> Result<String, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = new_id();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO tutor_profiles
            (id, user_id, bio, university, major, price, rating, review_count, image_url,
            education, locations, pricing_details, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, ?7, ?8, ?9, ?10, ?11, ?11)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&profile.bio)
    .bind(&profile.university)
    .bind(&profile.major)
    .bind(profile.price)
    .bind(&profile.image_url)
    .bind(&profile.education)
    .bind(&profile.locations)
    .bind(&profile.pricing_details)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(id)
}

/// Overwrites the editable fields. The image is only replaced when a new one was uploaded.
pub async fn update_profile(
    db: &SqlitePool,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE tutor_profiles
        SET bio = ?1,
            university = ?2,
            major = ?3,
            price = ?4,
            image_url = COALESCE(?5, image_url),
            updated_at = ?6
        WHERE user_id = ?7
        "#,
    )
    .bind(&update.bio)
    .bind(&update.university)
    .bind(&update.major)
    .bind(update.price)
    .bind(&update.image_url)
    .bind(now())
    .bind(user_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_rating<'e, E>(
    db: E,
    profile_id: &str,
    rating: f64,
    review_count: i64,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE tutor_profiles
        SET rating = ?1,
            review_count = ?2,
            updated_at = ?3
        WHERE id = ?4
        "#,
    )
    .bind(rating)
    .bind(review_count)
    .bind(now())
    .bind(profile_id)
    .execute(db)
    .await?;
    Ok(())
}

/// Links a tag to a profile, creating the tag on first use.
pub async fn attach_tag(
    conn: &mut SqliteConnection,
    profile_id: &str,
    name: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO tags (id, name) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING")
        .bind(new_id())
        .bind(name)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO tutor_tags (tutor_profile_id, tag_id)
        SELECT ?1, id FROM tags WHERE name = ?2
        "#,
    )
    .bind(profile_id)
    .bind(name)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Tag names ordered by how many tutors use them.
pub async fn popular_tags(db: &SqlitePool, limit: i64) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT t.name
        FROM tags t
        LEFT JOIN tutor_tags tt ON tt.tag_id = t.id
        GROUP BY t.id, t.name
        ORDER BY COUNT(tt.tutor_profile_id) DESC, t.name ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await
}
