// src/database/content.rs
//! Languages and UI translation strings.

use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

use super::now;
use crate::errors::Result;
use crate::models::{Language, Translation};

pub async fn list_active_languages(pool: &SqlitePool) -> Result<Vec<Language>> {
    let rows = sqlx::query(
        "SELECT code, name, native_name, is_active FROM languages WHERE is_active = 1 ORDER BY code",
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<Language> {
            Ok(Language {
                code: row.try_get("code")?,
                name: row.try_get("name")?,
                native_name: row.try_get("native_name")?,
                is_active: row.try_get("is_active")?,
            })
        })
        .collect()
}

/// `{key: value}` for one language.
pub async fn translations_for(pool: &SqlitePool, language: &str) -> Result<BTreeMap<String, String>> {
    let rows = sqlx::query("SELECT key, value FROM translations WHERE language_code = ?")
        .bind(language)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| -> Result<(String, String)> { Ok((row.try_get("key")?, row.try_get("value")?)) })
        .collect()
}

pub async fn upsert_translation(pool: &SqlitePool, translation: &Translation) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO translations (language_code, key, value, section, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (language_code, key)
        DO UPDATE SET value = excluded.value, section = excluded.section,
                      updated_at = excluded.updated_at
        "#,
    )
    .bind(&translation.language_code)
    .bind(&translation.key)
    .bind(&translation.value)
    .bind(&translation.section)
    .bind(now())
    .execute(pool)
    .await?;
    Ok(())
}
