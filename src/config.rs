// src/config.rs
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::errors::{QuizError, Result};

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIConfig {
    #[serde(default = "default_openai_base")]
    pub api_base: String,
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
}

/// Configuration for the Gemini provider.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_base")]
    pub api_base: String,
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
}

/// Admin account created at startup when no account with that email exists.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_name")]
    pub name: String,
}

/// High-level application configuration, built once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    #[serde(default = "default_true")]
    pub scheduler_enabled: bool,
    #[serde(default = "default_scheduler_interval_secs")]
    pub scheduler_interval_secs: u64,
    #[serde(default)]
    pub admin: Option<BootstrapAdmin>,
    #[serde(default)]
    pub openai: Option<OpenAIConfig>,
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_database_url() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    format!("sqlite:{}", base.join("incharge").join("incharge.db").display())
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_true() -> bool {
    true
}

fn default_scheduler_interval_secs() -> u64 {
    60 * 60
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            session_ttl_hours: default_session_ttl_hours(),
            cookie_secure: false,
            uploads_dir: default_uploads_dir(),
            scheduler_enabled: true,
            scheduler_interval_secs: default_scheduler_interval_secs(),
            admin: None,
            openai: None,
            gemini: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| QuizError::Config(format!("{} has an invalid value: {}", key, raw))),
        _ => Ok(None),
    }
}

fn env_flag(key: &str) -> Result<Option<bool>> {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            "" => Ok(None),
            _ => Err(QuizError::Config(format!("{} must be a boolean, got {}", key, raw))),
        },
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = AppConfig::default();
        config.apply_env()?;
        config.check()?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still win.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&raw)?;
        config.apply_env()?;
        config.check()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("HOST") {
            self.host = host;
        }
        if let Some(port) = env_parse("PORT")? {
            self.port = port;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(ttl) = env_parse("SESSION_TTL_HOURS")? {
            self.session_ttl_hours = ttl;
        }
        if let Some(secure) = env_flag("COOKIE_SECURE")? {
            self.cookie_secure = secure;
        }
        if let Ok(dir) = std::env::var("UPLOADS_DIR") {
            self.uploads_dir = PathBuf::from(dir);
        }
        if let Some(enabled) = env_flag("SCHEDULER_ENABLED")? {
            self.scheduler_enabled = enabled;
        }
        if let Some(secs) = env_parse("SCHEDULER_INTERVAL_SECS")? {
            self.scheduler_interval_secs = secs;
        }

        if let (Ok(email), Ok(password)) =
            (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD"))
        {
            self.admin = Some(BootstrapAdmin {
                email,
                password,
                name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| default_admin_name()),
            });
        }

        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            self.openai = Some(OpenAIConfig {
                api_base: std::env::var("OPENAI_API_BASE").unwrap_or_else(|_| default_openai_base()),
                api_key,
                model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| default_openai_model()),
            });
        }

        if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
            self.gemini = Some(GeminiConfig {
                api_base: std::env::var("GEMINI_API_BASE").unwrap_or_else(|_| default_gemini_base()),
                api_key,
                model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| default_gemini_model()),
            });
        }

        Ok(())
    }

    fn check(&self) -> Result<()> {
        if !self.database_url.starts_with("sqlite:") {
            return Err(QuizError::Config(
                "DATABASE_URL must start with 'sqlite:'".to_string(),
            ));
        }
        if self.session_ttl_hours <= 0 {
            return Err(QuizError::Config(
                "SESSION_TTL_HOURS must be positive".to_string(),
            ));
        }
        if self.scheduler_interval_secs == 0 {
            return Err(QuizError::Config(
                "SCHEDULER_INTERVAL_SECS must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_config_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            port = 8080
            database_url = "sqlite:/tmp/quiz.db"

            [openai]
            api_key = "sk-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_ttl_hours, 24);
        assert!(config.scheduler_enabled);
        let openai = config.openai.unwrap();
        assert_eq!(openai.model, "gpt-3.5-turbo");
        assert_eq!(openai.api_base, "https://api.openai.com/v1");
        assert!(config.gemini.is_none());
    }

    #[test]
    fn test_check_rejects_non_sqlite_urls() {
        let config = AppConfig {
            database_url: "mongodb://localhost:27017/quiz".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(config.check(), Err(QuizError::Config(_))));
        assert!(AppConfig::default().check().is_ok());
    }
}
