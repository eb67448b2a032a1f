//! Tutor profile editing, including the profile image upload.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::tutors;
use crate::error::AppError;
use crate::models::{ProfileUpdate, TutorProfile};

/// Where uploaded profile images end up.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `bytes` under `file_name` and returns the public URL of the file.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, AppError>;
}

/// Writes images into a local directory that is served under `url_prefix`.
pub struct LocalImageStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(file_name), bytes).await?;
        Ok(format!("{}/{}", self.url_prefix.trim_end_matches('/'), file_name))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Browsers send an empty part (or one literally named "undefined") when no file was picked.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty() || self.file_name.is_empty() || self.file_name == "undefined"
    }
}

/// The profile form as submitted. Text fields always overwrite.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub bio: String,
    pub university: String,
    pub major: String,
    pub price: Option<String>,
    pub image: Option<ImageUpload>,
}

pub fn parse_price(raw: Option<&str>) -> Result<i64, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| AppError::BadRequest(format!("Invalid price: {}", raw))),
    }
}

/// `<unix millis>-<original name with whitespace replaced by underscores>`, stripped of
/// anything that could leave the upload directory.
pub fn stored_file_name(millis: i64, original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        format!("{}-image", millis)
    } else {
        format!("{}-{}", millis, cleaned)
    }
}

pub async fn update_profile(
    db: &SqlitePool,
    images: &dyn ImageStore,
    user_id: &str,
    form: ProfileForm,
) -> Result<TutorProfile, AppError> {
    let price = parse_price(form.price.as_deref())?;

    if tutors::find_profile_by_user(db, user_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let image_url = match form.image.filter(|image| !image.is_empty()) {
        Some(image) => {
            if !image.content_type.starts_with("image/") {
                return Err(AppError::BadRequest("이미지 파일만 업로드 가능합니다.".to_string()));
            }
            let file_name = stored_file_name(Utc::now().timestamp_millis(), &image.file_name);
            let url = images.store(&file_name, &image.bytes).await?;
            info!("stored profile image for {} at {}", user_id, url);
            Some(url)
        }
        None => None,
    };

    let update = ProfileUpdate {
        bio: form.bio,
        university: form.university,
        major: form.major,
        price,
        image_url,
    };
    if !tutors::update_profile(db, user_id, &update).await? {
        return Err(AppError::NotFound);
    }

    tutors::find_profile_by_user(db, user_id)
        .await?
        .ok_or(AppError::NotFound)
}
