// src/api/handlers/account.rs
//! Login, logout, session check and password changes.

use actix_web::{HttpResponse, Result, web};
use serde::Deserialize;
use serde_json::json;

use crate::api::AppState;
use crate::api::auth::{AuthUser, expired_cookie, session_cookie};
use crate::auth::verify_password;
use crate::database::{sessions, users};
use crate::errors::QuizError;
use crate::models::UserSummary;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub new_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn require_password(password: &str) -> std::result::Result<(), QuizError> {
    if password.trim().is_empty() {
        return Err(QuizError::BadRequest("New password is required".to_string()));
    }
    Ok(())
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let user = users::find_by_email(&state.db_pool, &req.email)
        .await?
        .filter(|u| verify_password(&req.password, &u.password_hash))
        .ok_or(QuizError::InvalidCredentials)?;

    if !user.access_flag {
        log::warn!("Login refused for disabled account {}", user.email);
        return Err(QuizError::Forbidden("Account disabled".to_string()).into());
    }

    let token =
        sessions::create_session(&state.db_pool, &user.id, state.config.session_ttl_hours).await?;
    log::info!("User {} logged in", user.email);

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&token, &state.config))
        .json(json!({
            "user": UserSummary::from(&user),
            "token": token,
        })))
}

/// POST /api/auth/logout
pub async fn logout(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse> {
    sessions::delete_session(&state.db_pool, &auth.token).await?;
    Ok(HttpResponse::Ok()
        .cookie(expired_cookie(&state.config))
        .json(json!({ "message": "Logged out successfully" })))
}

/// GET /api/auth/me
pub async fn me(auth: AuthUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({ "user": UserSummary::from(&auth.user) })))
}

/// POST /api/auth/update-password
///
/// Only allowed while the account still carries its temporary password.
pub async fn update_password(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<UpdatePasswordRequest>,
) -> Result<HttpResponse> {
    if !auth.first_login_required {
        return Err(QuizError::Forbidden("Password update not allowed".to_string()).into());
    }
    require_password(&req.new_password)?;

    users::set_password(&state.db_pool, &auth.id, &req.new_password, false).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Password updated successfully" })))
}

/// PUT /api/users/reset-password
pub async fn reset_password(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse> {
    if !verify_password(&req.current_password, &auth.password_hash) {
        return Err(QuizError::BadRequest("Incorrect current password".to_string()).into());
    }
    require_password(&req.new_password)?;

    users::set_password(
        &state.db_pool,
        &auth.id,
        &req.new_password,
        auth.first_login_required,
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Password updated successfully" })))
}
