use std::sync::Arc;

use sqlx::SqlitePool;

use crate::services::ImageStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub images: Arc<dyn ImageStore>,
}
