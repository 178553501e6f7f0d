// src/analytics.rs
//! Admin dashboard roll-ups computed in memory from users and attempts.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::language;
use crate::models::{Classification, Outcome, Quiz, QuizAttempt, Score, User};
use crate::scoring;

const TOP_USERS: usize = 5;
const DEFAULT_ACTIVITY_DAYS: i64 = 30;
const MAX_PREFILLED_DAYS: i64 = 60;

#[derive(Debug, Clone, Default)]
pub struct AnalyticsFilter {
    /// `incharge`, `incontrol` or `balanced`; anything else means no filter.
    pub role: Option<String>,
    /// Case-insensitive match against name or email.
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Normalized language code; `all` means no filter.
    pub language: Option<String>,
    pub only_attempted: bool,
}

impl AnalyticsFilter {
    fn wanted_classification(&self) -> Option<Classification> {
        match self.role.as_deref()?.to_lowercase().as_str() {
            "incharge" => Some(Classification::InCharge),
            "incontrol" => Some(Classification::InControl),
            "balanced" => Some(Classification::Balanced),
            _ => None,
        }
    }

    fn matches_user(&self, user: &User) -> bool {
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                user.name.to_lowercase().contains(&term) || user.email.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }

    fn matches_attempt(&self, attempt: &QuizAttempt) -> bool {
        if let Some(lang) = self.language.as_deref() {
            if lang != "all" && attempt.language != lang {
                return false;
            }
        }
        if self.start_date.is_none() && self.end_date.is_none() {
            return true;
        }
        let Some(day) = attempt.completed_on() else {
            return false;
        };
        self.start_date.is_none_or(|start| day >= start) && self.end_date.is_none_or(|end| day <= end)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_users: usize,
    pub total_in_charge_score: u32,
    pub total_in_control_score: u32,
    pub total_questions: u32,
    pub in_charge_accuracy: f64,
    pub in_control_accuracy: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DistributionSlice {
    pub name: &'static str,
    pub value: usize,
    pub fill: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LanguageCount {
    pub name: String,
    pub attempts: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopUser {
    pub name: String,
    pub score: u32,
    #[serde(rename = "type")]
    pub classification: Classification,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub company: String,
    pub score: String,
    pub accuracy: String,
    pub last_quiz_date: String,
    pub result: Classification,
    pub attempt_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: Stats,
    pub daily_activity: Vec<DailyCount>,
    pub role_distribution: Vec<DistributionSlice>,
    pub language_distribution: Vec<LanguageCount>,
    pub top_users: Vec<TopUser>,
    pub users_table: Vec<UserRow>,
}

struct UserRollup<'a> {
    user: &'a User,
    attempts: Vec<&'a QuizAttempt>,
    classification: Classification,
}

/// Builds the dashboard. `attempts` must be ordered newest first.
pub fn build_dashboard(
    users: &[User],
    attempts: &[QuizAttempt],
    filter: &AnalyticsFilter,
    today: NaiveDate,
) -> Dashboard {
    let mut by_user: HashMap<&str, Vec<&QuizAttempt>> = HashMap::new();
    for attempt in attempts.iter().filter(|a| filter.matches_attempt(a)) {
        by_user.entry(attempt.user_id.as_str()).or_default().push(attempt);
    }

    let wanted = filter.wanted_classification();
    let summaries: Vec<UserRollup> = users
        .iter()
        .filter(|u| filter.matches_user(u))
        .map(|user| {
            let attempts = by_user.remove(user.id.as_str()).unwrap_or_default();
            let outcomes: Vec<Outcome> = attempts.iter().map(|a| a.result).collect();
            UserRollup {
                user,
                classification: scoring::aggregate(&outcomes),
                attempts,
            }
        })
        .filter(|s| wanted.is_none_or(|w| s.classification == w))
        .filter(|s| !filter.only_attempted || !s.attempts.is_empty())
        .collect();

    let relevant: Vec<&QuizAttempt> = summaries
        .iter()
        .flat_map(|s| s.attempts.iter().copied())
        .collect();

    Dashboard {
        stats: stats(summaries.len(), &relevant),
        daily_activity: daily_activity(&relevant, filter, today),
        role_distribution: role_distribution(&summaries),
        language_distribution: language_distribution(&relevant),
        top_users: top_users(&summaries),
        users_table: summaries.iter().map(user_row).collect(),
    }
}

fn stats(total_users: usize, attempts: &[&QuizAttempt]) -> Stats {
    let in_charge: u32 = attempts.iter().map(|a| a.score.in_charge).sum();
    let in_control: u32 = attempts.iter().map(|a| a.score.in_control).sum();
    let total = in_charge + in_control;
    let percent = |part: u32| {
        if total == 0 {
            0.0
        } else {
            f64::from(part) / f64::from(total) * 100.0
        }
    };

    Stats {
        total_users,
        total_in_charge_score: in_charge,
        total_in_control_score: in_control,
        total_questions: total,
        in_charge_accuracy: percent(in_charge),
        in_control_accuracy: percent(in_control),
    }
}

fn daily_activity(attempts: &[&QuizAttempt], filter: &AnalyticsFilter, today: NaiveDate) -> Vec<DailyCount> {
    let start = filter
        .start_date
        .unwrap_or_else(|| today - Duration::days(DEFAULT_ACTIVITY_DAYS));
    let end = filter.end_date.unwrap_or(today);

    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    if (end - start).num_days() < MAX_PREFILLED_DAYS {
        let mut day = start;
        while day <= end {
            days.insert(day, 0);
            day += Duration::days(1);
        }
    }

    for day in attempts.iter().filter_map(|a| a.completed_on()) {
        *days.entry(day).or_default() += 1;
    }

    days.into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

fn role_distribution(summaries: &[UserRollup]) -> Vec<DistributionSlice> {
    [
        (Classification::InCharge, "#a855f7"),
        (Classification::InControl, "#f43f5e"),
        (Classification::Balanced, "#22c55e"),
        (Classification::Unassessed, "#94a3b8"),
    ]
    .into_iter()
    .map(|(classification, fill)| DistributionSlice {
        name: classification.as_str(),
        value: summaries
            .iter()
            .filter(|s| s.classification == classification)
            .count(),
        fill,
    })
    .filter(|slice| slice.value > 0)
    .collect()
}

fn language_distribution(attempts: &[&QuizAttempt]) -> Vec<LanguageCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for attempt in attempts {
        *counts.entry(attempt.language.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(code, attempts)| LanguageCount {
            name: language::display_name(code),
            attempts,
        })
        .collect()
}

fn top_users(summaries: &[UserRollup]) -> Vec<TopUser> {
    let mut ranked: Vec<TopUser> = summaries
        .iter()
        .filter(|s| !s.attempts.is_empty())
        .map(|s| TopUser {
            name: s.user.name.clone(),
            score: s.attempts.iter().map(|a| a.score.in_charge).sum(),
            classification: s.classification,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(TOP_USERS);
    ranked
}

/// Share of the dominant side in a score, e.g. `70%`.
pub fn accuracy_label(score: Score) -> String {
    let total = match score.in_charge + score.in_control {
        0 => 1,
        n => n,
    };
    let dominant = score.in_charge.max(score.in_control);
    format!("{}%", (f64::from(dominant) / f64::from(total) * 100.0).round() as i64)
}

fn user_row(summary: &UserRollup) -> UserRow {
    let latest = summary.attempts.first();
    UserRow {
        id: summary.user.id.clone(),
        name: summary.user.name.clone(),
        email: summary.user.email.clone(),
        company: summary.user.company.clone(),
        score: latest
            .map(|a| format!("{}/{}", a.score.in_charge, a.score.in_control))
            .unwrap_or_else(|| "N/A".to_string()),
        accuracy: latest
            .map(|a| accuracy_label(a.score))
            .unwrap_or_else(|| "-".to_string()),
        last_quiz_date: latest
            .map(|a| a.completed_at.clone())
            .unwrap_or_else(|| "-".to_string()),
        result: summary.classification,
        attempt_count: summary.attempts.len(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttemptDetail {
    pub question_text: String,
    pub selected_answer: String,
    pub answer_type: crate::models::AnswerType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptDetails {
    pub quiz_title: String,
    pub result: Outcome,
    pub score: Score,
    pub total_questions: usize,
    pub completed_at: String,
    pub details: Vec<AttemptDetail>,
}

/// Pairs each stored response with its question in the attempt's language.
/// Responses whose question no longer exists are skipped.
pub fn attempt_details(attempt: &QuizAttempt, quiz: &Quiz) -> AttemptDetails {
    let content = quiz.content_for(&attempt.language);
    let questions = content.map(|c| c.questions.as_slice()).unwrap_or_default();

    let details: Vec<AttemptDetail> = attempt
        .responses
        .iter()
        .filter_map(|resp| {
            let question = questions.iter().find(|q| q.id == resp.question_id)?;
            let selected = question
                .options
                .iter()
                .find(|opt| opt.answer_type.answer_type() == Some(resp.answer_type))
                .map(|opt| opt.text.clone())
                .unwrap_or_else(|| "Unknown".to_string());
            Some(AttemptDetail {
                question_text: question.question_text.clone(),
                selected_answer: selected,
                answer_type: resp.answer_type,
            })
        })
        .collect();

    AttemptDetails {
        quiz_title: content
            .map(|c| c.title.clone())
            .unwrap_or_else(|| quiz.title().to_string()),
        result: attempt.result,
        score: attempt.score,
        total_questions: details.len(),
        completed_at: attempt.completed_at.clone(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerType, CanonicalAnswer, Role};

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            mobile: "9000000000".to_string(),
            password_hash: String::new(),
            company: "Acme".to_string(),
            role: Role::User,
            first_login_required: false,
            access_flag: true,
            profile_image: String::new(),
            last_active: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn attempt(user_id: &str, quiz_id: &str, in_charge: u32, completed_at: &str) -> QuizAttempt {
        let score = Score {
            in_charge,
            in_control: 10 - in_charge,
        };
        QuizAttempt {
            id: format!("{}-{}", user_id, quiz_id),
            user_id: user_id.to_string(),
            quiz_id: quiz_id.to_string(),
            responses: vec![CanonicalAnswer {
                question_id: "q1".to_string(),
                answer_type: AnswerType::InCharge,
            }],
            score,
            result: scoring::outcome_for(score),
            language: "en".to_string(),
            status: "completed".to_string(),
            completed_at: completed_at.to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    fn fixture() -> (Vec<User>, Vec<QuizAttempt>) {
        let users = vec![user("u1", "Asha"), user("u2", "Ravi"), user("u3", "Meera")];
        // Newest first.
        let attempts = vec![
            attempt("u1", "q2", 7, "2025-05-19T08:00:00+00:00"),
            attempt("u2", "q2", 2, "2025-05-19T09:00:00+00:00"),
            attempt("u1", "q1", 4, "2025-05-18T08:00:00+00:00"),
        ];
        (users, attempts)
    }

    #[test]
    fn test_only_attempted_users_by_default() {
        let (users, attempts) = fixture();
        let filter = AnalyticsFilter {
            only_attempted: true,
            ..Default::default()
        };
        let dashboard = build_dashboard(&users, &attempts, &filter, today());

        assert_eq!(dashboard.stats.total_users, 2);
        assert_eq!(dashboard.stats.total_in_charge_score, 13);
        assert_eq!(dashboard.stats.total_questions, 30);
        assert_eq!(dashboard.users_table.len(), 2);

        let asha = &dashboard.users_table[0];
        assert_eq!(asha.score, "7/3");
        assert_eq!(asha.accuracy, "70%");
        assert_eq!(asha.attempt_count, 2);
        // One In-Charge and one In-Control attempt tie to Balanced.
        assert_eq!(asha.result, Classification::Balanced);
    }

    #[test]
    fn test_unattempted_users_are_unassessed() {
        let (users, attempts) = fixture();
        let dashboard = build_dashboard(&users, &attempts, &AnalyticsFilter::default(), today());
        let meera = dashboard.users_table.iter().find(|r| r.name == "Meera").unwrap();
        assert_eq!(meera.result, Classification::Unassessed);
        assert_eq!(meera.score, "N/A");
        assert_eq!(meera.accuracy, "-");
        assert!(dashboard
            .role_distribution
            .iter()
            .any(|s| s.name == "Unassessed" && s.value == 1));
    }

    #[test]
    fn test_role_and_search_filters() {
        let (users, attempts) = fixture();
        let filter = AnalyticsFilter {
            role: Some("incontrol".to_string()),
            ..Default::default()
        };
        let dashboard = build_dashboard(&users, &attempts, &filter, today());
        assert_eq!(dashboard.users_table.len(), 1);
        assert_eq!(dashboard.users_table[0].name, "Ravi");

        let filter = AnalyticsFilter {
            search: Some("ASHA@".to_string()),
            ..Default::default()
        };
        let dashboard = build_dashboard(&users, &attempts, &filter, today());
        assert_eq!(dashboard.users_table.len(), 1);
        assert_eq!(dashboard.users_table[0].name, "Asha");
    }

    #[test]
    fn test_date_range_limits_attempts() {
        let (users, attempts) = fixture();
        let filter = AnalyticsFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 5, 19),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 19),
            only_attempted: true,
            ..Default::default()
        };
        let dashboard = build_dashboard(&users, &attempts, &filter, today());
        assert_eq!(dashboard.stats.total_users, 2);
        assert_eq!(
            dashboard.daily_activity,
            vec![DailyCount {
                date: NaiveDate::from_ymd_opt(2025, 5, 19).unwrap(),
                count: 2
            }]
        );
        let asha = dashboard.users_table.iter().find(|r| r.name == "Asha").unwrap();
        assert_eq!(asha.attempt_count, 1);
        assert_eq!(asha.result, Classification::InCharge);
    }

    #[test]
    fn test_daily_activity_prefills_default_window() {
        let (users, attempts) = fixture();
        let dashboard = build_dashboard(&users, &attempts, &AnalyticsFilter::default(), today());
        assert_eq!(dashboard.daily_activity.len(), 31);
        assert_eq!(dashboard.daily_activity.last().unwrap().date, today());
        let total: usize = dashboard.daily_activity.iter().map(|d| d.count).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_top_users_and_languages() {
        let (users, attempts) = fixture();
        let dashboard = build_dashboard(&users, &attempts, &AnalyticsFilter::default(), today());
        assert_eq!(dashboard.top_users[0].name, "Asha");
        assert_eq!(dashboard.top_users[0].score, 11);
        assert_eq!(dashboard.top_users.len(), 2);
        assert_eq!(
            dashboard.language_distribution,
            vec![LanguageCount {
                name: "English".to_string(),
                attempts: 3
            }]
        );
    }

    #[test]
    fn test_accuracy_label() {
        assert_eq!(accuracy_label(Score { in_charge: 0, in_control: 0 }), "0%");
        assert_eq!(accuracy_label(Score { in_charge: 1, in_control: 2 }), "67%");
        assert_eq!(accuracy_label(Score { in_charge: 5, in_control: 5 }), "50%");
    }
}
