// src/database/attempts.rs
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{is_unique_violation, now};
use crate::errors::{QuizError, Result};
use crate::language::DEFAULT_LANGUAGE;
use crate::models::{Outcome, QuizAttempt, QuizContent, Score, ScoredResult};

const ATTEMPT_COLUMNS: &str =
    "id, user_id, quiz_id, responses, in_charge, in_control, result, language, status, completed_at";

/// One line of a user's quiz history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub quiz_id: String,
    pub quiz_title: String,
    pub score: Score,
    pub result: Outcome,
    pub language: String,
    pub completed_at: String,
}

fn attempt_from_row(row: &SqliteRow) -> Result<QuizAttempt> {
    let responses: String = row.try_get("responses")?;
    let result: String = row.try_get("result")?;
    let in_charge: i64 = row.try_get("in_charge")?;
    let in_control: i64 = row.try_get("in_control")?;

    Ok(QuizAttempt {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        quiz_id: row.try_get("quiz_id")?,
        responses: serde_json::from_str(&responses)?,
        score: Score {
            in_charge: in_charge as u32,
            in_control: in_control as u32,
        },
        result: result.parse()?,
        language: row.try_get("language")?,
        status: row.try_get("status")?,
        completed_at: row.try_get("completed_at")?,
    })
}

/// Stores a scored attempt. A second attempt at the same quiz is
/// `Forbidden("Already attempted")`.
pub async fn insert_attempt(
    pool: &SqlitePool,
    user_id: &str,
    quiz_id: &str,
    scored: &ScoredResult,
    language: &str,
) -> Result<QuizAttempt> {
    let id = Uuid::new_v4().to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO quiz_attempts (id, user_id, quiz_id, responses, in_charge, in_control,
                                   result, language, status, completed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'completed', ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(quiz_id)
    .bind(serde_json::to_string(&scored.responses)?)
    .bind(i64::from(scored.score.in_charge))
    .bind(i64::from(scored.score.in_control))
    .bind(scored.outcome.as_str())
    .bind(language)
    .bind(now())
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(QuizError::Forbidden("Already attempted".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    get_attempt(pool, &id).await
}

pub async fn get_attempt(pool: &SqlitePool, id: &str) -> Result<QuizAttempt> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM quiz_attempts WHERE id = ?",
        ATTEMPT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| QuizError::NotFound("Attempt not found".to_string()))?;
    attempt_from_row(&row)
}

pub async fn find_attempt(
    pool: &SqlitePool,
    user_id: &str,
    quiz_id: &str,
) -> Result<Option<QuizAttempt>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM quiz_attempts WHERE user_id = ? AND quiz_id = ?",
        ATTEMPT_COLUMNS
    ))
    .bind(user_id)
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(attempt_from_row).transpose()
}

/// Every attempt, newest first.
pub async fn list_attempts(pool: &SqlitePool) -> Result<Vec<QuizAttempt>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM quiz_attempts ORDER BY completed_at DESC",
        ATTEMPT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    rows.iter().map(attempt_from_row).collect()
}

/// A user's attempts with their quiz titles, newest first. Attempts whose
/// quiz was deleted or has no title show as "General Quiz".
pub async fn user_history(pool: &SqlitePool, user_id: &str) -> Result<Vec<HistoryEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT a.id, a.quiz_id, a.in_charge, a.in_control, a.result, a.language,
               a.completed_at, q.content
        FROM quiz_attempts a
        LEFT JOIN quizzes q ON q.id = a.quiz_id
        WHERE a.user_id = ?
        ORDER BY a.completed_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<HistoryEntry> {
            let content: Option<String> = row.try_get("content")?;
            let language: String = row.try_get("language")?;
            let result: String = row.try_get("result")?;
            let in_charge: i64 = row.try_get("in_charge")?;
            let in_control: i64 = row.try_get("in_control")?;

            Ok(HistoryEntry {
                id: row.try_get("id")?,
                quiz_id: row.try_get("quiz_id")?,
                quiz_title: content
                    .as_deref()
                    .and_then(|c| title_in(c, &language))
                    .unwrap_or_else(|| "General Quiz".to_string()),
                score: Score {
                    in_charge: in_charge as u32,
                    in_control: in_control as u32,
                },
                result: result.parse()?,
                language,
                completed_at: row.try_get("completed_at")?,
            })
        })
        .collect()
}

fn title_in(content_json: &str, language: &str) -> Option<String> {
    let content: BTreeMap<String, QuizContent> = serde_json::from_str(content_json).ok()?;
    content
        .get(language)
        .or_else(|| content.get(DEFAULT_LANGUAGE))
        .or_else(|| content.values().next())
        .map(|c| c.title.clone())
        .filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::quizzes::{NewQuiz, insert_quiz};
    use crate::database::test_pool;
    use crate::database::users::{NewUser, create_user};
    use crate::generator::template_draft;
    use crate::models::{Answer, GeneratedBy, QuizStatus, Role};
    use crate::scoring;
    use chrono::NaiveDate;

    async fn seed(pool: &SqlitePool) -> (String, String) {
        let user = create_user(
            pool,
            &NewUser {
                name: "Meera".to_string(),
                email: "meera@example.com".to_string(),
                mobile: "9000001234".to_string(),
                password: "ME1234".to_string(),
                company: String::new(),
                role: Role::User,
                access_flag: true,
                first_login_required: false,
            },
        )
        .await
        .unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let quiz = insert_quiz(
            pool,
            NewQuiz {
                content: BTreeMap::from([("en".to_string(), template_draft(day))]),
                status: QuizStatus::Active,
                generated_by: GeneratedBy::Manual,
                requires_admin_approval: false,
                active_date: Some(day),
            },
        )
        .await
        .unwrap();

        (user.id, quiz.id)
    }

    fn scored() -> ScoredResult {
        scoring::score(&[
            Answer::new("q1", "In-Charge"),
            Answer::new("q2", "In-Control"),
            Answer::new("q3", "in charge"),
        ])
    }

    #[tokio::test]
    async fn test_insert_and_find_attempt() {
        let pool = test_pool().await;
        let (user_id, quiz_id) = seed(&pool).await;

        let attempt = insert_attempt(&pool, &user_id, &quiz_id, &scored(), "en")
            .await
            .unwrap();
        assert_eq!(attempt.score, Score { in_charge: 2, in_control: 1 });
        assert_eq!(attempt.result, Outcome::InCharge);
        assert_eq!(attempt.responses.len(), 3);

        let found = find_attempt(&pool, &user_id, &quiz_id).await.unwrap().unwrap();
        assert_eq!(found.id, attempt.id);
    }

    #[tokio::test]
    async fn test_second_attempt_is_forbidden() {
        let pool = test_pool().await;
        let (user_id, quiz_id) = seed(&pool).await;

        insert_attempt(&pool, &user_id, &quiz_id, &scored(), "en")
            .await
            .unwrap();
        let err = insert_attempt(&pool, &user_id, &quiz_id, &scored(), "en")
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::Forbidden(ref m) if m == "Already attempted"));
        assert_eq!(list_attempts(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_uses_quiz_title() {
        let pool = test_pool().await;
        let (user_id, quiz_id) = seed(&pool).await;
        insert_attempt(&pool, &user_id, &quiz_id, &scored(), "hi")
            .await
            .unwrap();

        let history = user_history(&pool, &user_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].quiz_title, "Daily Balance Quiz (Template) - 2025-04-01");
        assert_eq!(history[0].language, "hi");
        assert!(user_history(&pool, "nobody").await.unwrap().is_empty());
    }
}
