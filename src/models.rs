// src/models.rs
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::QuizError;
use crate::language::DEFAULT_LANGUAGE;

/// Classification carried by an answer option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerType {
    #[serde(rename = "In-Charge")]
    InCharge,
    #[serde(rename = "In-Control")]
    InControl,
}

impl AnswerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerType::InCharge => "In-Charge",
            AnswerType::InControl => "In-Control",
        }
    }
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An option label as authored. Anything other than the two canonical labels
/// is kept verbatim so the structural validator can report it. A missing or
/// null label reads as an empty `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum OptionLabel {
    Known(AnswerType),
    Other(String),
}

impl Default for OptionLabel {
    fn default() -> Self {
        OptionLabel::Other(String::new())
    }
}

impl OptionLabel {
    pub fn answer_type(&self) -> Option<AnswerType> {
        match self {
            OptionLabel::Known(t) => Some(*t),
            OptionLabel::Other(_) => None,
        }
    }
}

impl From<String> for OptionLabel {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "In-Charge" => OptionLabel::Known(AnswerType::InCharge),
            "In-Control" => OptionLabel::Known(AnswerType::InControl),
            _ => OptionLabel::Other(raw),
        }
    }
}

impl From<Option<String>> for OptionLabel {
    fn from(raw: Option<String>) -> Self {
        raw.map(OptionLabel::from).unwrap_or_default()
    }
}

impl From<OptionLabel> for String {
    fn from(label: OptionLabel) -> Self {
        match label {
            OptionLabel::Known(t) => t.as_str().to_string(),
            OptionLabel::Other(raw) => raw,
        }
    }
}

impl From<AnswerType> for OptionLabel {
    fn from(t: AnswerType) -> Self {
        OptionLabel::Known(t)
    }
}

/// Result of a single scored attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "In-Charge")]
    InCharge,
    #[serde(rename = "In-Control")]
    InControl,
    Balanced,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::InCharge => "In-Charge",
            Outcome::InControl => "In-Control",
            Outcome::Balanced => "Balanced",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In-Charge" => Ok(Outcome::InCharge),
            "In-Control" => Ok(Outcome::InControl),
            "Balanced" => Ok(Outcome::Balanced),
            other => Err(QuizError::Invalid(format!("Unknown outcome '{}'", other))),
        }
    }
}

/// Roll-up of many attempts. `Unassessed` exists only at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "In-Charge")]
    InCharge,
    #[serde(rename = "In-Control")]
    InControl,
    Balanced,
    Unassessed,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::InCharge => "In-Charge",
            Classification::InControl => "In-Control",
            Classification::Balanced => "Balanced",
            Classification::Unassessed => "Unassessed",
        }
    }
}

impl From<Outcome> for Classification {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::InCharge => Classification::InCharge,
            Outcome::InControl => Classification::InControl,
            Outcome::Balanced => Classification::Balanced,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "type")]
    pub answer_type: OptionLabel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

/// Title, description and questions of a quiz in one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizStatus {
    Draft,
    Approved,
    Active,
    Archived,
    Inactive,
}

impl QuizStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizStatus::Draft => "DRAFT",
            QuizStatus::Approved => "APPROVED",
            QuizStatus::Active => "ACTIVE",
            QuizStatus::Archived => "ARCHIVED",
            QuizStatus::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for QuizStatus {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(QuizStatus::Draft),
            "APPROVED" => Ok(QuizStatus::Approved),
            "ACTIVE" => Ok(QuizStatus::Active),
            "ARCHIVED" => Ok(QuizStatus::Archived),
            "INACTIVE" => Ok(QuizStatus::Inactive),
            other => Err(QuizError::BadRequest(format!("Unknown quiz status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GeneratedBy {
    Manual,
    Ai,
}

impl GeneratedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratedBy::Manual => "MANUAL",
            GeneratedBy::Ai => "AI",
        }
    }
}

impl FromStr for GeneratedBy {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANUAL" => Ok(GeneratedBy::Manual),
            "AI" => Ok(GeneratedBy::Ai),
            other => Err(QuizError::Invalid(format!("Unknown quiz origin '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub languages: Vec<String>,
    pub content: BTreeMap<String, QuizContent>,
    pub status: QuizStatus,
    pub generated_by: GeneratedBy,
    pub requires_admin_approval: bool,
    pub active_date: Option<NaiveDate>,
    pub created_at: String,
    pub updated_at: String,
}

impl Quiz {
    /// Content for `language`, falling back to the default language and then
    /// to whichever language was authored first.
    pub fn content_for(&self, language: &str) -> Option<&QuizContent> {
        self.content
            .get(language)
            .or_else(|| self.content.get(DEFAULT_LANGUAGE))
            .or_else(|| self.content.values().next())
    }

    pub fn title(&self) -> &str {
        self.content_for(DEFAULT_LANGUAGE)
            .map(|c| c.title.as_str())
            .unwrap_or("")
    }
}

/// A submitted answer exactly as the client sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(default)]
    pub question_id: String,
    #[serde(default, alias = "type")]
    pub answer_type: String,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, answer_type: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            answer_type: answer_type.into(),
        }
    }
}

/// An answer after normalization; the only form that gets persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalAnswer {
    pub question_id: String,
    pub answer_type: AnswerType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub in_charge: u32,
    pub in_control: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    pub score: Score,
    pub outcome: Outcome,
    pub responses: Vec<CanonicalAnswer>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub responses: Vec<CanonicalAnswer>,
    pub score: Score,
    pub result: Outcome,
    pub language: String,
    pub status: String,
    pub completed_at: String,
}

impl QuizAttempt {
    /// Calendar day (UTC) of completion, if the stored timestamp parses.
    pub fn completed_on(&self) -> Option<NaiveDate> {
        DateTime::parse_from_rfc3339(&self.completed_at)
            .ok()
            .map(|dt| dt.naive_utc().date())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(QuizError::Invalid(format!("Unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub company: String,
    pub role: Role,
    pub first_login_required: bool,
    pub access_flag: bool,
    pub profile_image: String,
    pub last_active: String,
    pub created_at: String,
    pub updated_at: String,
}

/// What the login and session endpoints reveal about a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub first_login_required: bool,
    pub company: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            first_login_required: user.first_login_required,
            company: user.company.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub code: String,
    pub name: String,
    pub native_name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub language_code: String,
    pub key: String,
    pub value: String,
    #[serde(default = "default_section")]
    pub section: String,
}

fn default_true() -> bool {
    true
}

fn default_section() -> String {
    "general".to_string()
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp and keeps the UTC date.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_utc().date())
        })
}
