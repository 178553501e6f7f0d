// src/api/state.rs
use crate::config::AppConfig;
use crate::providers::{self, LlmProvider};
use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: SqlitePool,
    pub client: Client,
    pub provider: Option<Arc<dyn LlmProvider>>,
}

impl AppState {
    /// Builds shared state and picks the LLM backend from `config`.
    pub fn new(config: AppConfig, db_pool: SqlitePool) -> Self {
        let client = Client::new();
        let provider = providers::from_config(&config, &client);

        match &provider {
            Some(p) => log::info!("Quiz drafts will use {}", p.name()),
            None => log::info!("No LLM provider configured; quiz drafts use the built-in template"),
        }

        Self {
            config: Arc::new(config),
            db_pool,
            client,
            provider,
        }
    }

    /// Replaces the LLM backend, e.g. with a canned provider in tests.
    pub fn with_provider(mut self, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        self.provider = provider;
        self
    }
}
