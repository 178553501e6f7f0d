// src/errors.rs
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::scoring::StructureError;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Unexpected response structure: {0}")]
    UnexpectedResponse(String),

    #[error("Received empty text response from model")]
    EmptyResponse,

    #[error("AI did not return valid JSON")]
    InvalidDraft,

    #[error("AI generated invalid quiz: {0}")]
    DraftRejected(StructureError),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Import failed: {0}")]
    Import(String),

    #[error("{0}")]
    TooLarge(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Please authenticate.")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, QuizError>;

impl ResponseError for QuizError {
    fn status_code(&self) -> StatusCode {
        match self {
            QuizError::Invalid(_)
            | QuizError::BadRequest(_)
            | QuizError::Import(_)
            | QuizError::JsonParse(_) => StatusCode::BAD_REQUEST,
            QuizError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            QuizError::NotFound(_) => StatusCode::NOT_FOUND,
            QuizError::Unauthorized | QuizError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            QuizError::Forbidden(_) => StatusCode::FORBIDDEN,
            QuizError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("Request failed: {}", self);
            match self {
                QuizError::DraftRejected(_)
                | QuizError::InvalidDraft
                | QuizError::EmptyResponse
                | QuizError::ApiError { .. }
                | QuizError::UnexpectedResponse(_) => {
                    format!("AI Generation failed: {}", self)
                }
                _ => "Server error".to_string(),
            }
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(json!({ "error": message }))
    }
}
