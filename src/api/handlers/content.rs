// src/api/handlers/content.rs
use actix_web::{HttpResponse, Result, web};
use serde::Deserialize;

use crate::api::AppState;
use crate::api::auth::AdminUser;
use crate::database::content;
use crate::errors::QuizError;
use crate::language;
use crate::models::Translation;

#[derive(Deserialize)]
pub struct TranslationQuery {
    pub lang: Option<String>,
}

/// GET /api/content/languages
pub async fn languages(state: web::Data<AppState>) -> Result<HttpResponse> {
    let languages = content::list_active_languages(&state.db_pool).await?;
    Ok(HttpResponse::Ok().json(languages))
}

/// GET /api/content/translations?lang=
pub async fn translations(
    state: web::Data<AppState>,
    query: web::Query<TranslationQuery>,
) -> Result<HttpResponse> {
    let lang = query
        .lang
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| QuizError::BadRequest("Language code required".to_string()))?;

    let map = content::translations_for(&state.db_pool, &language::normalize(lang)).await?;
    Ok(HttpResponse::Ok().json(map))
}

/// POST /api/content/translations
pub async fn upsert_translation(
    state: web::Data<AppState>,
    _admin: AdminUser,
    req: web::Json<Translation>,
) -> Result<HttpResponse> {
    let mut translation = req.into_inner();
    if translation.key.trim().is_empty() {
        return Err(QuizError::BadRequest("Translation key required".to_string()).into());
    }
    translation.language_code = language::normalize(&translation.language_code);

    content::upsert_translation(&state.db_pool, &translation).await?;
    Ok(HttpResponse::Ok().json(translation))
}
