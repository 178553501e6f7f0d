// src/database/sessions.rs
//! Server-side sessions. Only the sha256 digest of a token is stored.

use chrono::{Duration, SecondsFormat, Utc};
use sqlx::SqlitePool;

use super::now;
use super::users;
use crate::auth;
use crate::errors::Result;
use crate::models::User;

/// Opens a session for `user_id` and returns the raw token to hand the client.
pub async fn create_session(pool: &SqlitePool, user_id: &str, ttl_hours: i64) -> Result<String> {
    let token = auth::new_session_token();
    let expires_at =
        (Utc::now() + Duration::hours(ttl_hours)).to_rfc3339_opts(SecondsFormat::Millis, true);

    sqlx::query(
        "INSERT INTO sessions (token_hash, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(auth::token_digest(&token))
    .bind(user_id)
    .bind(&expires_at)
    .bind(now())
    .execute(pool)
    .await?;

    Ok(token)
}

/// Resolves a token to its user if the session exists and has not expired.
pub async fn find_session_user(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let user_id: Option<String> =
        sqlx::query_scalar("SELECT user_id FROM sessions WHERE token_hash = ? AND expires_at > ?")
            .bind(auth::token_digest(token))
            .bind(now())
            .fetch_optional(pool)
            .await?;

    match user_id {
        Some(id) => users::find_by_id(pool, &id).await,
        None => Ok(None),
    }
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(auth::token_digest(token))
        .execute(pool)
        .await?;
    Ok(())
}

/// Ends every session of a user, e.g. after a password reset.
pub async fn delete_user_sessions(pool: &SqlitePool, user_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn purge_expired(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
