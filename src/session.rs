//! The cookie session: plaintext `session_user_id` and `session_user_role`
//! cookies, set on login/registration and read by every `/web` handler.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::AppError;
use crate::models::{Role, User};

pub const USER_COOKIE: &str = "session_user_id";
pub const ROLE_COOKIE: &str = "session_user_role";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
}

impl Session {
    pub fn from_jar(jar: &CookieJar) -> Option<Self> {
        let user_id = jar
            .get(USER_COOKIE)
            .map(|c| c.value().trim().to_string())
            .filter(|id| !id.is_empty())?;
        let role = jar
            .get(ROLE_COOKIE)
            .and_then(|c| c.value().parse().ok())
            .unwrap_or_default();
        Some(Self { user_id, role })
    }

    pub fn is_tutor(&self) -> bool {
        self.role == Role::Tutor
    }

    /// Adds both session cookies for `user` to the jar.
    pub fn start(jar: CookieJar, user: &User) -> CookieJar {
        jar.add(session_cookie(USER_COOKIE, user.id.clone()))
            .add(session_cookie(ROLE_COOKIE, user.role.to_string()))
    }

    pub fn end(jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(USER_COOKIE).path("/"))
            .remove(Cookie::build(ROLE_COOKIE).path("/"))
    }
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Session::from_jar(&jar).ok_or_else(|| AppError::Unauthorized("로그인이 필요합니다.".to_string()))
    }
}

impl<S> OptionalFromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(Session::from_jar(&jar))
    }
}
