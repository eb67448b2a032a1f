#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;

use studydol::api;
use studydol::error::AppError;
use studydol::models::{RegisterRequest, User};
use studydol::services::{ImageStore, auth};
use studydol::state::AppState;

/// A fresh in-memory database with the schema applied. One connection only:
/// every connection to `sqlite::memory:` is its own database.
pub async fn pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Failed to parse database url")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to create database");

    studydol::db::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

#[derive(Default)]
pub struct MemoryImageStore {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, AppError> {
        self.files
            .lock()
            .expect("image store poisoned")
            .insert(file_name.to_string(), bytes.to_vec());
        Ok(format!("/uploads/{}", file_name))
    }
}

pub async fn register(db: &SqlitePool, email: &str, name: &str, role: &str) -> User {
    auth::register(
        db,
        RegisterRequest {
            email: email.to_string(),
            password: "password".to_string(),
            name: name.to_string(),
            role: Some(role.to_string()),
        },
    )
    .await
    .expect("Failed to register user")
}

pub async fn student(db: &SqlitePool, name: &str) -> User {
    register(db, &format!("{}@student.test", name), name, "student").await
}

pub async fn tutor(db: &SqlitePool, name: &str) -> User {
    register(db, &format!("{}@tutor.test", name), name, "tutor").await
}

/// The cookie header a browser would send for `user`.
pub fn cookie_for(user: &User) -> String {
    format!("session_user_id={}; session_user_role={}", user.id, user.role)
}

/// Turns `Set-Cookie` headers into a `Cookie` request header.
pub fn cookie_from(headers: &HeaderMap) -> String {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct TestApp {
    pub db: SqlitePool,
    pub images: Arc<MemoryImageStore>,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = pool().await;
        let images = Arc::new(MemoryImageStore::default());
        let router = api::router(AppState {
            db: db.clone(),
            images: images.clone(),
        });
        Self { db, images, router }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router failed");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response is not JSON")
        };

        Response { status, headers, body }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.send(request).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.call(Method::GET, uri, cookie, None).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> Response {
        self.call(Method::POST, uri, cookie, Some(body)).await
    }
}
