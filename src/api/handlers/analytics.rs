// src/api/handlers/analytics.rs
use actix_web::{HttpResponse, Result, web};
use chrono::Utc;
use serde::Deserialize;

use crate::analytics::{self, AnalyticsFilter};
use crate::api::AppState;
use crate::api::auth::AdminUser;
use crate::database::{attempts, quizzes, users};
use crate::errors::QuizError;
use crate::language;
use crate::models::{Role, parse_calendar_date};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub role: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub language: Option<String>,
    pub only_attempted: Option<String>,
}

impl AnalyticsQuery {
    fn into_filter(self) -> std::result::Result<AnalyticsFilter, QuizError> {
        let date = |raw: Option<String>| match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(d) => parse_calendar_date(d)
                .map(Some)
                .ok_or_else(|| QuizError::BadRequest(format!("Invalid date '{}'", d))),
        };

        Ok(AnalyticsFilter {
            role: self.role,
            search: self.search,
            start_date: date(self.start_date)?,
            end_date: date(self.end_date)?,
            language: self
                .language
                .filter(|l| !l.trim().is_empty())
                .map(|l| match l.trim() {
                    "all" => "all".to_string(),
                    other => language::normalize(other),
                }),
            // Defaults to participants who have taken at least one quiz.
            only_attempted: self.only_attempted.as_deref() != Some("false"),
        })
    }
}

/// GET /api/admin/analytics
pub async fn dashboard(
    state: web::Data<AppState>,
    _admin: AdminUser,
    query: web::Query<AnalyticsQuery>,
) -> Result<HttpResponse> {
    let filter = query.into_inner().into_filter()?;

    let (participants, all_attempts) = futures::try_join!(
        users::list_by_role(&state.db_pool, Role::User),
        attempts::list_attempts(&state.db_pool),
    )?;

    let dashboard = analytics::build_dashboard(
        &participants,
        &all_attempts,
        &filter,
        Utc::now().date_naive(),
    );
    Ok(HttpResponse::Ok().json(dashboard))
}

/// GET /api/admin/analytics/users/{id}/history
pub async fn user_history(
    state: web::Data<AppState>,
    _admin: AdminUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let history = attempts::user_history(&state.db_pool, &path).await?;
    Ok(HttpResponse::Ok().json(history))
}

/// GET /api/admin/analytics/attempts/{id}
pub async fn attempt_details(
    state: web::Data<AppState>,
    _admin: AdminUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let attempt = attempts::get_attempt(&state.db_pool, &path).await?;
    let quiz = quizzes::get_quiz(&state.db_pool, &attempt.quiz_id).await?;
    Ok(HttpResponse::Ok().json(analytics::attempt_details(&attempt, &quiz)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_query_defaults() {
        let filter = AnalyticsQuery::default().into_filter().unwrap();
        assert!(filter.only_attempted);
        assert!(filter.start_date.is_none());
        assert!(filter.language.is_none());
    }

    #[test]
    fn test_query_parsing() {
        let filter = AnalyticsQuery {
            start_date: Some("2025-01-05".to_string()),
            language: Some("Hindi".to_string()),
            only_attempted: Some("false".to_string()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2025, 1, 5));
        assert_eq!(filter.language.as_deref(), Some("hi"));
        assert!(!filter.only_attempted);

        let bad = AnalyticsQuery {
            end_date: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(bad.into_filter().is_err());
    }
}
