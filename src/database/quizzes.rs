// src/database/quizzes.rs
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::now;
use crate::errors::{QuizError, Result};
use crate::models::{GeneratedBy, Quiz, QuizContent, QuizStatus};

const QUIZ_COLUMNS: &str =
    "id, content, status, generated_by, requires_admin_approval, active_date, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub content: BTreeMap<String, QuizContent>,
    pub status: QuizStatus,
    pub generated_by: GeneratedBy,
    pub requires_admin_approval: bool,
    pub active_date: Option<NaiveDate>,
}

/// Partial update; `None` keeps the stored value. `active_date: Some(None)`
/// clears the date.
#[derive(Debug, Clone, Default)]
pub struct QuizUpdate {
    pub content: Option<BTreeMap<String, QuizContent>>,
    pub status: Option<QuizStatus>,
    pub active_date: Option<Option<NaiveDate>>,
}

/// Gives every question an id. The question at index `i` shares one id
/// across all languages, so answers stay comparable between translations.
pub fn assign_question_ids(content: &mut BTreeMap<String, QuizContent>) {
    let longest = content.values().map(|c| c.questions.len()).max().unwrap_or(0);

    for i in 0..longest {
        let id = content
            .values()
            .filter_map(|c| c.questions.get(i))
            .map(|q| q.id.trim())
            .find(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        for question in content.values_mut().filter_map(|c| c.questions.get_mut(i)) {
            if question.id.trim().is_empty() {
                question.id = id.clone();
            }
        }
    }
}

fn quiz_from_row(row: &SqliteRow) -> Result<Quiz> {
    let content: String = row.try_get("content")?;
    let content: BTreeMap<String, QuizContent> = serde_json::from_str(&content)?;
    let status: String = row.try_get("status")?;
    let generated_by: String = row.try_get("generated_by")?;
    let active_date: Option<String> = row.try_get("active_date")?;

    Ok(Quiz {
        id: row.try_get("id")?,
        languages: content.keys().cloned().collect(),
        content,
        status: status.parse()?,
        generated_by: generated_by.parse()?,
        requires_admin_approval: row.try_get("requires_admin_approval")?,
        active_date: active_date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn date_column(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

pub async fn insert_quiz(pool: &SqlitePool, new_quiz: NewQuiz) -> Result<Quiz> {
    let NewQuiz {
        mut content,
        status,
        generated_by,
        requires_admin_approval,
        active_date,
    } = new_quiz;

    assign_question_ids(&mut content);
    let id = Uuid::new_v4().to_string();
    let stamp = now();

    sqlx::query(
        r#"
        INSERT INTO quizzes (id, content, status, generated_by, requires_admin_approval,
                             active_date, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(serde_json::to_string(&content)?)
    .bind(status.as_str())
    .bind(generated_by.as_str())
    .bind(requires_admin_approval)
    .bind(date_column(active_date))
    .bind(&stamp)
    .bind(&stamp)
    .execute(pool)
    .await?;

    log::info!(
        "Created {} quiz {} ({})",
        generated_by.as_str(),
        id,
        status.as_str()
    );
    get_quiz(pool, &id).await
}

/// Fetches a quiz, or `NotFound("Quiz not found")`.
pub async fn get_quiz(pool: &SqlitePool, id: &str) -> Result<Quiz> {
    find_quiz(pool, id)
        .await?
        .ok_or_else(|| QuizError::NotFound("Quiz not found".to_string()))
}

pub async fn find_quiz(pool: &SqlitePool, id: &str) -> Result<Option<Quiz>> {
    let row = sqlx::query(&format!("SELECT {} FROM quizzes WHERE id = ?", QUIZ_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(quiz_from_row).transpose()
}

/// Newest first, optionally restricted to one status.
pub async fn list_quizzes(pool: &SqlitePool, status: Option<QuizStatus>) -> Result<Vec<Quiz>> {
    let rows = match status {
        Some(status) => {
            sqlx::query(&format!(
                "SELECT {} FROM quizzes WHERE status = ? ORDER BY created_at DESC",
                QUIZ_COLUMNS
            ))
            .bind(status.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM quizzes ORDER BY created_at DESC",
                QUIZ_COLUMNS
            ))
            .fetch_all(pool)
            .await?
        }
    };
    rows.iter().map(quiz_from_row).collect()
}

pub async fn update_quiz(pool: &SqlitePool, id: &str, update: QuizUpdate) -> Result<Quiz> {
    let mut quiz = get_quiz(pool, id).await?;

    if let Some(mut content) = update.content {
        assign_question_ids(&mut content);
        quiz.languages = content.keys().cloned().collect();
        quiz.content = content;
    }
    if let Some(status) = update.status {
        quiz.status = status;
    }
    if let Some(active_date) = update.active_date {
        quiz.active_date = active_date;
    }

    sqlx::query(
        "UPDATE quizzes SET content = ?, status = ?, active_date = ?, updated_at = ? WHERE id = ?",
    )
    .bind(serde_json::to_string(&quiz.content)?)
    .bind(quiz.status.as_str())
    .bind(date_column(quiz.active_date))
    .bind(now())
    .bind(id)
    .execute(pool)
    .await?;

    get_quiz(pool, id).await
}

/// The ACTIVE quiz scheduled for `day`, ignoring `exclude_id`.
pub async fn find_active_for_date(
    pool: &SqlitePool,
    day: NaiveDate,
    exclude_id: Option<&str>,
) -> Result<Option<Quiz>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM quizzes WHERE status = 'ACTIVE' AND active_date = ? AND id != ? \
         ORDER BY updated_at DESC LIMIT 1",
        QUIZ_COLUMNS
    ))
    .bind(date_column(Some(day)))
    .bind(exclude_id.unwrap_or(""))
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(quiz_from_row).transpose()
}

/// Whether an AI quiz was created on the UTC calendar day `day`.
pub async fn ai_quiz_created_on(pool: &SqlitePool, day: NaiveDate) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM quizzes WHERE generated_by = 'AI' AND substr(created_at, 1, 10) = ?",
    )
    .bind(date_column(Some(day)))
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::generator::template_draft;
    use crate::models::Question;
    use chrono::Utc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn new_quiz(status: QuizStatus) -> NewQuiz {
        NewQuiz {
            content: BTreeMap::from([("en".to_string(), template_draft(day()))]),
            status,
            generated_by: GeneratedBy::Manual,
            requires_admin_approval: true,
            active_date: None,
        }
    }

    #[test]
    fn test_question_ids_shared_across_languages() {
        let question = |id: &str| Question {
            id: id.to_string(),
            question_text: "Q".to_string(),
            options: Vec::new(),
        };
        let mut content = BTreeMap::from([
            (
                "en".to_string(),
                QuizContent {
                    title: "T".to_string(),
                    description: None,
                    questions: vec![question(""), question("")],
                },
            ),
            (
                "hi".to_string(),
                QuizContent {
                    title: "T".to_string(),
                    description: None,
                    questions: vec![question("keep-me"), question("")],
                },
            ),
        ]);

        assign_question_ids(&mut content);

        assert_eq!(content["en"].questions[0].id, "keep-me");
        assert_eq!(content["hi"].questions[0].id, "keep-me");
        assert!(!content["en"].questions[1].id.is_empty());
        assert_eq!(content["en"].questions[1].id, content["hi"].questions[1].id);
    }

    #[tokio::test]
    async fn test_insert_and_fetch_quiz() {
        let pool = test_pool().await;
        let quiz = insert_quiz(&pool, new_quiz(QuizStatus::Draft)).await.unwrap();

        assert_eq!(quiz.languages, vec!["en".to_string()]);
        assert_eq!(quiz.status, QuizStatus::Draft);
        assert!(quiz.content["en"].questions.iter().all(|q| !q.id.is_empty()));

        let fetched = get_quiz(&pool, &quiz.id).await.unwrap();
        assert_eq!(fetched.content, quiz.content);

        assert!(matches!(
            get_quiz(&pool, "missing").await,
            Err(QuizError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let pool = test_pool().await;
        insert_quiz(&pool, new_quiz(QuizStatus::Draft)).await.unwrap();
        insert_quiz(&pool, new_quiz(QuizStatus::Approved)).await.unwrap();

        assert_eq!(list_quizzes(&pool, None).await.unwrap().len(), 2);
        let approved = list_quizzes(&pool, Some(QuizStatus::Approved)).await.unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].status, QuizStatus::Approved);
    }

    #[tokio::test]
    async fn test_active_for_date_excludes_self() {
        let pool = test_pool().await;
        let quiz = insert_quiz(&pool, new_quiz(QuizStatus::Approved)).await.unwrap();
        update_quiz(
            &pool,
            &quiz.id,
            QuizUpdate {
                status: Some(QuizStatus::Active),
                active_date: Some(Some(day())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let found = find_active_for_date(&pool, day(), None).await.unwrap().unwrap();
        assert_eq!(found.id, quiz.id);
        assert_eq!(found.active_date, Some(day()));
        assert!(find_active_for_date(&pool, day(), Some(&quiz.id)).await.unwrap().is_none());
        assert!(find_active_for_date(&pool, day().succ_opt().unwrap(), None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_ai_quiz_created_today() {
        let pool = test_pool().await;
        let today = Utc::now().date_naive();
        assert!(!ai_quiz_created_on(&pool, today).await.unwrap());

        let mut quiz = new_quiz(QuizStatus::Draft);
        quiz.generated_by = GeneratedBy::Ai;
        insert_quiz(&pool, quiz).await.unwrap();
        assert!(ai_quiz_created_on(&pool, today).await.unwrap());
    }
}
