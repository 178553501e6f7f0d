// src/database/mod.rs
use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::{QuizError, Result};

pub mod attempts;
pub mod content;
pub mod quizzes;
pub mod sessions;
pub mod users;

/// Opens (creating if needed) the SQLite database and runs migrations.
pub async fn init_db(database_url: &str) -> Result<SqlitePool> {
    let db_path_str = database_url.strip_prefix("sqlite:").ok_or_else(|| {
        QuizError::Config("DATABASE_URL must start with 'sqlite:'".to_string())
    })?;

    if db_path_str.starts_with(":memory:") {
        return connect(database_url, 1).await;
    }

    let db_path = PathBuf::from(db_path_str.trim_start_matches("//"));

    // Create parent directory BEFORE attempting to connect
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
        log::info!("Database directory ready: {}", parent.display());
    }

    let absolute_path = if db_path.is_relative() {
        std::env::current_dir()?.join(&db_path)
    } else {
        db_path
    };

    log::info!("Database file path: {}", absolute_path.display());
    connect(&format!("sqlite://{}", absolute_path.display()), 5).await
}

/// Connects to `url` and brings the schema up to date.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Database migrations completed");

    Ok(pool)
}

/// Current time in the fixed-width format every timestamp column uses.
pub(crate) fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    connect("sqlite::memory:", 1)
        .await
        .expect("in-memory database should open")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_db_creates_file_and_schema() {
        let dir = std::env::temp_dir().join(format!("incharge-db-{}", uuid::Uuid::new_v4()));
        let url = format!("sqlite:{}", dir.join("nested").join("quiz.db").display());

        let pool = init_db(&url).await.unwrap();
        assert!(dir.join("nested").join("quiz.db").exists());

        let languages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM languages")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(languages >= 1);

        pool.close().await;
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_init_db_rejects_other_schemes() {
        assert!(matches!(
            init_db("postgres://localhost/quiz").await,
            Err(QuizError::Config(_))
        ));
    }

    #[test]
    fn test_now_is_fixed_width() {
        let stamp = now();
        assert_eq!(stamp.len(), "2025-01-01T00:00:00.000Z".len());
        assert!(stamp.ends_with('Z'));
    }
}
