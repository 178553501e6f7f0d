// src/api/handlers/admin_quizzes.rs
//! Quiz authoring and lifecycle: DRAFT -> APPROVED -> ACTIVE.

use actix_web::{HttpResponse, Result, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::api::AppState;
use crate::api::auth::AdminUser;
use crate::database::quizzes::{self, NewQuiz, QuizUpdate};
use crate::errors::QuizError;
use crate::generator;
use crate::import::parse_quiz_text;
use crate::language;
use crate::models::{GeneratedBy, Question, QuizContent, QuizStatus, parse_calendar_date};
use crate::scoring::{self, StructureError, ValidationReport};

fn double_option<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Quiz body accepted by create, update and validate. Either a single
/// language (`questions` plus optional `title`, `description`, `language`)
/// or a full `content` map keyed by language.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub questions: Option<Vec<Question>>,
    pub language: Option<String>,
    pub content: Option<BTreeMap<String, QuizContent>>,
    /// Absent leaves the date alone; `null` or `""` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub active_date: Option<Option<String>>,
}

impl QuizPayload {
    fn language(&self) -> String {
        language::normalize(self.language.as_deref().unwrap_or_default())
    }

    fn has_questions(&self) -> bool {
        self.content.is_some() || self.questions.is_some()
    }

    /// Applies the payload on top of `base`, normalizing language keys.
    fn merge_into(&self, mut base: BTreeMap<String, QuizContent>) -> BTreeMap<String, QuizContent> {
        if let Some(content) = &self.content {
            return content
                .iter()
                .map(|(lang, c)| (language::normalize(lang), c.clone()))
                .collect();
        }

        let entry = base.entry(self.language()).or_default();
        if let Some(questions) = &self.questions {
            entry.questions = questions.clone();
        }
        if let Some(title) = self.title.as_ref().filter(|t| !t.trim().is_empty()) {
            entry.title = title.clone();
        }
        if let Some(desc) = self.description.as_ref().filter(|d| !d.trim().is_empty()) {
            entry.description = Some(desc.clone());
        }
        base
    }

    fn active_date(&self) -> std::result::Result<Option<Option<NaiveDate>>, QuizError> {
        match &self.active_date {
            None => Ok(None),
            Some(None) => Ok(Some(None)),
            Some(Some(raw)) if raw.trim().is_empty() => Ok(Some(None)),
            Some(Some(raw)) => parse_calendar_date(raw)
                .map(|d| Some(Some(d)))
                .ok_or_else(|| QuizError::BadRequest(format!("Invalid date '{}'", raw))),
        }
    }
}

fn structure_check(content: &BTreeMap<String, QuizContent>) -> std::result::Result<(), QuizError> {
    scoring::validate_content(content).map_err(|e| QuizError::BadRequest(e.to_string()))
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct ParseTextRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct ParseTextResponse {
    pub questions: Vec<Question>,
    pub validation: ValidationReport,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    pub active_date: Option<String>,
}

/// GET /api/admin/quizzes?status=
pub async fn list_quizzes(
    state: web::Data<AppState>,
    _admin: AdminUser,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse> {
    let status = match query.status.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Some(s.parse::<QuizStatus>()?),
        _ => None,
    };
    let quizzes = quizzes::list_quizzes(&state.db_pool, status).await?;
    Ok(HttpResponse::Ok().json(quizzes))
}

/// POST /api/admin/quizzes
pub async fn create_quiz(
    state: web::Data<AppState>,
    _admin: AdminUser,
    req: web::Json<QuizPayload>,
) -> Result<HttpResponse> {
    if !req.has_questions() {
        return Err(QuizError::BadRequest(StructureError::MissingQuestions.to_string()).into());
    }
    let content = req.merge_into(BTreeMap::new());
    structure_check(&content)?;

    let quiz = quizzes::insert_quiz(
        &state.db_pool,
        NewQuiz {
            content,
            status: QuizStatus::Draft,
            generated_by: GeneratedBy::Manual,
            requires_admin_approval: true,
            active_date: req.active_date()?.flatten(),
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(quiz))
}

/// POST /api/admin/quizzes/generate
pub async fn generate_quiz(state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse> {
    let today = Utc::now().date_naive();
    let fallback_title = format!("AI Generated Quiz - {}", today);
    let draft = generator::draft_quiz(state.provider.as_deref(), today, &fallback_title).await?;

    let quiz = quizzes::insert_quiz(
        &state.db_pool,
        NewQuiz {
            content: BTreeMap::from([(language::DEFAULT_LANGUAGE.to_string(), draft)]),
            status: QuizStatus::Draft,
            generated_by: GeneratedBy::Ai,
            requires_admin_approval: true,
            active_date: None,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(quiz))
}

/// POST /api/admin/quizzes/validate
pub async fn validate_quiz(
    _admin: AdminUser,
    req: web::Json<QuizPayload>,
) -> Result<HttpResponse> {
    let verdict = if req.has_questions() {
        scoring::validate_content(&req.merge_into(BTreeMap::new()))
    } else {
        Err(StructureError::MissingQuestions)
    };
    let report = ValidationReport::from(&verdict);
    Ok(HttpResponse::Ok().json(report))
}

/// POST /api/admin/quizzes/parse-text
pub async fn parse_text(
    _admin: AdminUser,
    req: web::Json<ParseTextRequest>,
) -> Result<HttpResponse> {
    let questions = parse_quiz_text(&req.text);
    let validation = ValidationReport::from(&scoring::validate(&questions));
    Ok(HttpResponse::Ok().json(ParseTextResponse {
        questions,
        validation,
    }))
}

/// GET /api/admin/quizzes/{id}
pub async fn get_quiz(
    state: web::Data<AppState>,
    _admin: AdminUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let quiz = quizzes::get_quiz(&state.db_pool, &path).await?;
    Ok(HttpResponse::Ok().json(quiz))
}

/// PUT /api/admin/quizzes/{id}
pub async fn update_quiz(
    state: web::Data<AppState>,
    _admin: AdminUser,
    path: web::Path<String>,
    req: web::Json<QuizPayload>,
) -> Result<HttpResponse> {
    let quiz = quizzes::get_quiz(&state.db_pool, &path).await?;
    if quiz.status == QuizStatus::Active {
        return Err(QuizError::BadRequest(
            "Cannot edit an ACTIVE quiz. Deactivate it first.".to_string(),
        )
        .into());
    }

    let content = req.merge_into(quiz.content.clone());
    if req.has_questions() {
        structure_check(&content)?;
    }

    let quiz = quizzes::update_quiz(
        &state.db_pool,
        &quiz.id,
        QuizUpdate {
            content: Some(content),
            status: None,
            active_date: req.active_date()?,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(quiz))
}

/// POST /api/admin/quizzes/{id}/approve
pub async fn approve_quiz(
    state: web::Data<AppState>,
    _admin: AdminUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let quiz = quizzes::get_quiz(&state.db_pool, &path).await?;
    if quiz.status != QuizStatus::Draft {
        return Err(QuizError::BadRequest("Only DRAFT quizzes can be approved.".to_string()).into());
    }

    scoring::validate_content(&quiz.content)
        .map_err(|e| QuizError::BadRequest(format!("Cannot approve invalid quiz: {}", e)))?;

    let quiz = quizzes::update_quiz(
        &state.db_pool,
        &quiz.id,
        QuizUpdate {
            status: Some(QuizStatus::Approved),
            ..Default::default()
        },
    )
    .await?;

    log::info!("Quiz {} approved", quiz.id);
    Ok(HttpResponse::Ok().json(quiz))
}

/// POST /api/admin/quizzes/{id}/activate
///
/// At most one ACTIVE quiz per calendar day.
pub async fn activate_quiz(
    state: web::Data<AppState>,
    _admin: AdminUser,
    path: web::Path<String>,
    req: web::Json<ActivateRequest>,
) -> Result<HttpResponse> {
    let raw = req
        .active_date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| QuizError::BadRequest("Active date is required.".to_string()))?;
    let day = parse_calendar_date(raw)
        .ok_or_else(|| QuizError::BadRequest(format!("Invalid date '{}'", raw)))?;

    let quiz = quizzes::get_quiz(&state.db_pool, &path).await?;
    if !matches!(
        quiz.status,
        QuizStatus::Draft | QuizStatus::Approved | QuizStatus::Active
    ) {
        return Err(QuizError::BadRequest(
            "Quiz must be DRAFT or APPROVED before activation.".to_string(),
        )
        .into());
    }

    if quizzes::find_active_for_date(&state.db_pool, day, Some(&quiz.id))
        .await?
        .is_some()
    {
        return Err(QuizError::Conflict(format!(
            "Another quiz is already active for {}.",
            day.format("%a %b %d %Y")
        ))
        .into());
    }

    let quiz = quizzes::update_quiz(
        &state.db_pool,
        &quiz.id,
        QuizUpdate {
            status: Some(QuizStatus::Active),
            active_date: Some(Some(day)),
            ..Default::default()
        },
    )
    .await?;

    log::info!("Quiz {} active on {}", quiz.id, day);
    Ok(HttpResponse::Ok().json(quiz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_active_date_states() {
        let absent: QuizPayload = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.active_date().unwrap(), None);

        let cleared: QuizPayload = serde_json::from_value(json!({"activeDate": null})).unwrap();
        assert_eq!(cleared.active_date().unwrap(), Some(None));

        let set: QuizPayload =
            serde_json::from_value(json!({"activeDate": "2025-02-03T18:30:00.000Z"})).unwrap();
        assert_eq!(
            set.active_date().unwrap(),
            Some(NaiveDate::from_ymd_opt(2025, 2, 3))
        );

        let bad: QuizPayload = serde_json::from_value(json!({"activeDate": "soon"})).unwrap();
        assert!(bad.active_date().is_err());
    }

    #[test]
    fn test_merge_single_language_payload() {
        let payload: QuizPayload = serde_json::from_value(json!({
            "title": "Updated",
            "language": "hindi",
            "questions": []
        }))
        .unwrap();

        let base = BTreeMap::from([(
            "en".to_string(),
            QuizContent {
                title: "Original".to_string(),
                description: None,
                questions: Vec::new(),
            },
        )]);
        let merged = payload.merge_into(base);

        assert_eq!(merged["en"].title, "Original");
        assert_eq!(merged["hi"].title, "Updated");
        assert!(payload.has_questions());
    }

    #[test]
    fn test_merge_content_map_normalizes_keys() {
        let payload: QuizPayload = serde_json::from_value(json!({
            "content": {"English": {"title": "T", "questions": []}}
        }))
        .unwrap();
        let merged = payload.merge_into(BTreeMap::new());
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["en"]);
    }
}
