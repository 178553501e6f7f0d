// src/providers/openai.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::OpenAIConfig;
use crate::errors::{QuizError, Result};
use crate::providers::LlmProvider;

/// A provider for interacting with OpenAI chat models.
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider`.
    pub fn new(client: Client, config: OpenAIConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> String {
        format!("openai:{}", self.config.model)
    }

    /// Sends the prompt as the system message of a chat completion.
    async fn generate(&self, prompt: &str) -> Result<(String, u64)> {
        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));

        log::info!("Calling OpenAI: {} with model: {}", url, self.config.model);

        let body = OpenAIRequest {
            model: &self.config.model,
            messages: vec![Message {
                role: "system",
                content: prompt,
            }],
            temperature: 0.7,
        };

        let start = Instant::now();

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let latency_ms = start.elapsed().as_millis() as u64;

        log::info!("OpenAI response status: {} ({}ms)", status, latency_ms);

        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            return Err(QuizError::ApiError {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let openai_resp: OpenAIResponse = resp.json().await?;

        let output = openai_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| QuizError::UnexpectedResponse("No choices in response".to_string()))?;

        if output.trim().is_empty() {
            return Err(QuizError::EmptyResponse);
        }

        Ok((output, latency_ms))
    }
}
