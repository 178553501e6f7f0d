// src/providers/gemini.rs

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Instant;

use crate::config::GeminiConfig;
use crate::errors::{QuizError, Result};
use crate::providers::LlmProvider;

/// A provider for interacting with Google's Gemini models.
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider`.
    pub fn new(client: Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }
}

/// Pulls the first candidate's text out of a `generateContent` response.
fn extract_text(response_json: &serde_json::Value) -> Result<String> {
    if let Some(error) = response_json.get("error") {
        return Err(QuizError::UnexpectedResponse(error.to_string()));
    }

    let output = response_json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .ok_or_else(|| QuizError::UnexpectedResponse(response_json.to_string()))?;

    if output.trim().is_empty() {
        return Err(QuizError::EmptyResponse);
    }

    Ok(output.to_string())
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> String {
        format!("gemini:{}", self.config.model)
    }

    async fn generate(&self, prompt: &str) -> Result<(String, u64)> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        );

        log::info!("Calling Gemini: {} with model: {}", url, self.config.model);

        let body = json!({
            "systemInstruction": {"parts": [{"text": prompt}]},
            "contents": [{"role": "user", "parts": [{"text": "Generate today's quiz."}]}],
            "generationConfig": {"responseMimeType": "application/json"}
        });

        let start = Instant::now();

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let latency_ms = start.elapsed().as_millis() as u64;

        log::info!("Gemini response status: {} ({}ms)", status, latency_ms);

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

        let response_json: serde_json::Value = resp.json().await?;
        Ok((extract_text(&response_json)?, latency_ms))
    }
}
