// src/api/auth.rs
//! Request extractors for authenticated routes.
//!
//! The session token is read from the `token` cookie first, then from an
//! `Authorization: Bearer` header.

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, web};
use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;

use crate::api::AppState;
use crate::config::AppConfig;
use crate::database::{sessions, users};
use crate::errors::QuizError;
use crate::models::{Role, User};

pub const TOKEN_COOKIE: &str = "token";

pub fn request_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub fn session_cookie(token: &str, config: &AppConfig) -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::hours(config.session_ttl_hours))
        .finish()
}

pub fn expired_cookie(config: &AppConfig) -> Cookie<'static> {
    let mut cookie = session_cookie("", config);
    cookie.make_removal();
    cookie
}

/// Any logged-in user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.user
    }
}

/// A logged-in user with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl Deref for AdminUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0.user
    }
}

async fn authenticate(
    state: Option<web::Data<AppState>>,
    token: Option<String>,
) -> Result<AuthUser, QuizError> {
    let state = state.ok_or_else(|| QuizError::Config("Application state missing".to_string()))?;
    let token = token.ok_or(QuizError::Unauthorized)?;

    let user = sessions::find_session_user(&state.db_pool, &token)
        .await?
        .ok_or(QuizError::Unauthorized)?;

    if !user.access_flag {
        return Err(QuizError::Forbidden("Account disabled".to_string()));
    }

    users::touch_last_active(&state.db_pool, &user.id).await?;
    Ok(AuthUser { user, token })
}

impl FromRequest for AuthUser {
    type Error = QuizError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = request_token(req);
        Box::pin(authenticate(state, token))
    }
}

impl FromRequest for AdminUser {
    type Error = QuizError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = request_token(req);
        Box::pin(async move {
            let auth = authenticate(state, token).await?;
            if auth.user.role != Role::Admin {
                return Err(QuizError::Forbidden("Admin access required".to_string()));
            }
            Ok(AdminUser(auth))
        })
    }
}
