// src/api/handlers/mod.rs
mod account;
pub mod admin_quizzes;
pub mod admin_users;
mod analytics;
mod content;
mod health;
mod profile;
mod quiz;
pub mod ws;

pub use account::{login, logout, me, reset_password, update_password};
pub use admin_quizzes::{
    activate_quiz, approve_quiz, create_quiz, generate_quiz, get_quiz, list_quizzes, parse_text,
    update_quiz, validate_quiz,
};
pub use admin_users::{import, list_users};
pub use analytics::{attempt_details, dashboard, user_history};
pub use content::{languages, translations, upsert_translation};
pub use health::health_check;
pub use profile::{get_profile, update_profile, upload_profile_image};
pub use quiz::{get_active_quiz, get_history, submit_quiz};
pub use ws::{WsBroker, ws_handler};
