// src/scheduler.rs
//! Background loop that keeps one AI-drafted quiz per day waiting for review.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::api::AppState;
use crate::database::{quizzes, sessions};
use crate::errors::Result;
use crate::generator;
use crate::language::DEFAULT_LANGUAGE;
use crate::models::{GeneratedBy, Quiz, QuizStatus};
use crate::providers::LlmProvider;

/// Drafts today's AI quiz unless one was already created today.
/// Returns the new quiz, or `None` when nothing needed doing.
pub async fn ensure_daily_draft(
    pool: &SqlitePool,
    provider: Option<&dyn LlmProvider>,
    today: NaiveDate,
) -> Result<Option<Quiz>> {
    if quizzes::ai_quiz_created_on(pool, today).await? {
        log::info!("Scheduler: AI quiz for {} already exists. Skipping.", today);
        return Ok(None);
    }

    log::info!("Scheduler: generating daily AI quiz for {}", today);
    let fallback_title = format!("Daily AI Quiz - {}", today);
    let draft = generator::draft_quiz(provider, today, &fallback_title).await?;

    let quiz = quizzes::insert_quiz(
        pool,
        quizzes::NewQuiz {
            content: BTreeMap::from([(DEFAULT_LANGUAGE.to_string(), draft)]),
            status: QuizStatus::Draft,
            generated_by: GeneratedBy::Ai,
            requires_admin_approval: true,
            active_date: None,
        },
    )
    .await?;

    Ok(Some(quiz))
}

async fn tick(state: &AppState) {
    let today = Utc::now().date_naive();
    match ensure_daily_draft(&state.db_pool, state.provider.as_deref(), today).await {
        Ok(Some(quiz)) => log::info!("Scheduler: daily draft {} created", quiz.id),
        Ok(None) => {}
        Err(e) => log::error!("Scheduler error: {}", e),
    }

    match sessions::purge_expired(&state.db_pool).await {
        Ok(0) => {}
        Ok(n) => log::info!("Scheduler: purged {} expired sessions", n),
        Err(e) => log::error!("Scheduler: session cleanup failed: {}", e),
    }
}

/// Runs forever; the first check happens immediately.
pub async fn run(state: AppState) {
    let period = Duration::from_secs(state.config.scheduler_interval_secs);
    log::info!("Daily quiz scheduler started (every {}s)", period.as_secs());

    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        tick(&state).await;
    }
}
