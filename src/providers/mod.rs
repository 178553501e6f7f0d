// src/providers/mod.rs

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::Result;

pub mod gemini;
pub mod openai;

/// A text-generation backend used to draft quizzes.
///
/// Object safe so the configured backend can live in shared state as
/// `Arc<dyn LlmProvider>`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short name used in logs, e.g. `openai:gpt-3.5-turbo`.
    fn name(&self) -> String;

    /// Sends `prompt` and returns the generated text and the latency in milliseconds.
    async fn generate(&self, prompt: &str) -> Result<(String, u64)>;
}

/// Picks the first configured backend: OpenAI, then Gemini.
pub fn from_config(config: &AppConfig, client: &Client) -> Option<Arc<dyn LlmProvider>> {
    if let Some(openai) = &config.openai {
        return Some(Arc::new(openai::OpenAIProvider::new(client.clone(), openai.clone())));
    }
    if let Some(gemini) = &config.gemini {
        return Some(Arc::new(gemini::GeminiProvider::new(client.clone(), gemini.clone())));
    }
    None
}
