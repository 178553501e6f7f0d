// src/api/handlers/quiz.rs
//! Quiz taking: today's quiz, submission and personal history.

use actix_web::{HttpResponse, Result, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::api::auth::AuthUser;
use crate::api::handlers::ws::{SubmissionUpdate, WsBroker};
use crate::database::{attempts, quizzes};
use crate::errors::QuizError;
use crate::generator::shuffle_options;
use crate::language;
use crate::models::{Answer, Question, Quiz, QuizAttempt};
use crate::scoring;

#[derive(Deserialize)]
pub struct LanguageQuery {
    pub lang: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub quiz_id: String,
    #[serde(default)]
    pub responses: Vec<Answer>,
    pub language: Option<String>,
}

/// A quiz as shown to a participant, in a single language.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub language: String,
    pub languages: Vec<String>,
    pub active_date: Option<NaiveDate>,
}

impl QuizView {
    fn localized(quiz: &Quiz, requested: &str) -> Self {
        let language = if quiz.content.contains_key(requested) {
            requested.to_string()
        } else if quiz.content.contains_key(language::DEFAULT_LANGUAGE) {
            language::DEFAULT_LANGUAGE.to_string()
        } else {
            quiz.languages.first().cloned().unwrap_or_default()
        };
        let content = quiz.content_for(&language).cloned().unwrap_or_default();

        Self {
            id: quiz.id.clone(),
            title: content.title,
            description: content.description,
            questions: content.questions,
            language,
            languages: quiz.languages.clone(),
            active_date: quiz.active_date,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveQuizResponse {
    pub quiz: QuizView,
    pub already_attempted: bool,
    pub attempt: Option<QuizAttempt>,
}

/// GET /api/quiz/active?lang=
pub async fn get_active_quiz(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<LanguageQuery>,
) -> Result<HttpResponse> {
    let today = Utc::now().date_naive();
    let quiz = quizzes::find_active_for_date(&state.db_pool, today, None)
        .await?
        .ok_or_else(|| QuizError::NotFound("No active quiz for today".to_string()))?;

    let attempt = attempts::find_attempt(&state.db_pool, &auth.id, &quiz.id).await?;

    let requested = language::normalize(query.lang.as_deref().unwrap_or_default());
    let mut view = QuizView::localized(&quiz, &requested);
    shuffle_options(&mut view.questions, &mut rand::thread_rng());

    Ok(HttpResponse::Ok().json(ActiveQuizResponse {
        quiz: view,
        already_attempted: attempt.is_some(),
        attempt,
    }))
}

/// POST /api/quiz/submit
pub async fn submit_quiz(
    state: web::Data<AppState>,
    broker: web::Data<WsBroker>,
    auth: AuthUser,
    req: web::Json<SubmitRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let quiz = quizzes::get_quiz(&state.db_pool, &req.quiz_id).await?;

    if attempts::find_attempt(&state.db_pool, &auth.id, &quiz.id)
        .await?
        .is_some()
    {
        return Err(QuizError::Forbidden("Already attempted".to_string()).into());
    }

    let language = language::normalize(req.language.as_deref().unwrap_or_default());
    let scored = scoring::score(&req.responses);
    let attempt =
        attempts::insert_attempt(&state.db_pool, &auth.id, &quiz.id, &scored, &language).await?;

    log::info!(
        "User {} submitted quiz {}: {} ({}/{})",
        auth.id,
        quiz.id,
        attempt.result,
        attempt.score.in_charge,
        attempt.score.in_control
    );

    broker
        .broadcast(SubmissionUpdate::from_attempt(&attempt, &auth.name))
        .await;

    Ok(HttpResponse::Ok().json(attempt))
}

/// GET /api/quiz/history
pub async fn get_history(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse> {
    let history = attempts::user_history(&state.db_pool, &auth.id).await?;
    Ok(HttpResponse::Ok().json(history))
}
