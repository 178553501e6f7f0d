// src/generator.rs
//! Drafts a daily quiz with an LLM, or from a built-in template when no
//! provider is configured.

use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;
use std::sync::LazyLock;

use crate::errors::{QuizError, Result};
use crate::models::{AnswerOption, AnswerType, Question, QuizContent};
use crate::providers::LlmProvider;
use crate::scoring;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?").expect("code fence pattern is valid"));

const SYSTEM_PROMPT: &str = r#"You are a Quiz Generator for the 'In-Charge vs In-Control' leadership framework.
Generate a valid JSON object representing a quiz with exactly 10 questions.
The object may have a 'title' and a 'description' string.
It must have 'questions': an array of objects, each with:
- 'questionText': string
- 'options': array of exactly 4 objects.
Each option object must have:
- 'text': string
- 'answerType': string, strictly either "In-Charge" or "In-Control".

RULES:
1. Exactly 10 questions.
2. Exactly 4 options per question.
3. EXACTLY ONE option must be "In-Charge".
4. EXACTLY THREE options must be "In-Control".
5. Output purely valid JSON, no markdown formatting."#;

const TEMPLATE_DESCRIPTION: &str =
    "An automatically generated quiz to test your In-Charge vs In-Control balance.";

/// Parses a model reply into quiz content, tolerating markdown code fences.
pub fn parse_draft(reply: &str) -> Result<QuizContent> {
    let cleaned = CODE_FENCE.replace_all(reply, "");
    serde_json::from_str(cleaned.trim()).map_err(|e| {
        log::error!("Failed to parse JSON from AI: {} ({})", cleaned.trim(), e);
        QuizError::InvalidDraft
    })
}

/// Shuffles the options of every question in place.
pub fn shuffle_options<R: Rng + ?Sized>(questions: &mut [Question], rng: &mut R) {
    for q in questions.iter_mut() {
        q.options.shuffle(rng);
    }
}

/// Structurally valid draft used when no LLM is configured.
pub fn template_draft(day: NaiveDate) -> QuizContent {
    let option = |text: &str, answer_type: AnswerType| AnswerOption {
        text: text.to_string(),
        answer_type: answer_type.into(),
    };

    let questions = (1..=scoring::QUESTIONS_PER_QUIZ)
        .map(|i| Question {
            id: String::new(),
            question_text: format!(
                "Scenario {}: a deadline is at risk and the team is unsure how to proceed. What do you do?",
                i
            ),
            options: vec![
                option("Take charge and set the direction immediately", AnswerType::InCharge),
                option("Wait and see how things develop", AnswerType::InControl),
                option("Ask someone more senior to decide", AnswerType::InControl),
                option("Tighten the existing checklist and follow it", AnswerType::InControl),
            ],
        })
        .collect();

    QuizContent {
        title: format!("Daily Balance Quiz (Template) - {}", day),
        description: Some(TEMPLATE_DESCRIPTION.to_string()),
        questions,
    }
}

/// Produces a validated draft with shuffled options. Blank titles and
/// descriptions are filled in from `fallback_title`.
pub async fn draft_quiz(
    provider: Option<&dyn LlmProvider>,
    day: NaiveDate,
    fallback_title: &str,
) -> Result<QuizContent> {
    let mut draft = match provider {
        None => {
            log::info!("No LLM provider configured. Using the built-in quiz template.");
            template_draft(day)
        }
        Some(provider) => {
            log::info!("Drafting quiz with {}", provider.name());
            let (reply, latency_ms) = provider.generate(SYSTEM_PROMPT).await?;
            log::info!("Draft received from {} in {}ms", provider.name(), latency_ms);

            let draft = parse_draft(&reply)?;
            scoring::validate(&draft.questions).map_err(QuizError::DraftRejected)?;
            draft
        }
    };

    shuffle_options(&mut draft.questions, &mut rand::thread_rng());

    if draft.title.trim().is_empty() {
        draft.title = fallback_title.to_string();
    }
    if draft.description.as_deref().is_none_or(|d| d.trim().is_empty()) {
        draft.description = Some("Automatically generated quiz draft.".to_string());
    }

    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OptionLabel;
    use async_trait::async_trait;

    struct CannedProvider(String);

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn name(&self) -> String {
            "canned".to_string()
        }

        async fn generate(&self, _prompt: &str) -> Result<(String, u64)> {
            Ok((self.0.clone(), 3))
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn template_json() -> String {
        let mut draft = template_draft(day());
        draft.title = String::new();
        draft.description = None;
        serde_json::to_string(&draft).unwrap()
    }

    #[test]
    fn test_template_is_valid() {
        assert_eq!(scoring::validate(&template_draft(day()).questions), Ok(()));
    }

    #[test]
    fn test_parse_draft_strips_code_fences_and_legacy_fields() {
        let reply = r#"```json
{"title": "Monday", "questions": [{"questionText": "Q?", "options": [
  {"text": "a", "type": "In-Charge"},
  {"text": "b", "type": "In-Control"}
]}]}
```"#;
        let draft = parse_draft(reply).unwrap();
        assert_eq!(draft.title, "Monday");
        assert_eq!(draft.questions.len(), 1);
        assert_eq!(
            draft.questions[0].options[0].answer_type,
            OptionLabel::Known(AnswerType::InCharge)
        );
    }

    #[test]
    fn test_parse_draft_rejects_prose() {
        assert!(matches!(
            parse_draft("Sure! Here is your quiz."),
            Err(QuizError::InvalidDraft)
        ));
    }

    #[test]
    fn test_shuffle_keeps_options() {
        let mut questions = template_draft(day()).questions;
        let before = questions[0].options.clone();
        shuffle_options(&mut questions, &mut rand::thread_rng());
        assert_eq!(questions[0].options.len(), before.len());
        for opt in &before {
            assert!(questions[0].options.contains(opt));
        }
    }

    #[tokio::test]
    async fn test_draft_without_provider_uses_template() {
        let draft = draft_quiz(None, day(), "unused").await.unwrap();
        assert_eq!(draft.title, "Daily Balance Quiz (Template) - 2025-06-01");
        assert_eq!(scoring::validate(&draft.questions), Ok(()));
    }

    #[tokio::test]
    async fn test_draft_fills_missing_title() {
        let provider = CannedProvider(template_json());
        let draft = draft_quiz(Some(&provider as &dyn LlmProvider), day(), "AI Generated Quiz - 2025-06-01")
            .await
            .unwrap();
        assert_eq!(draft.title, "AI Generated Quiz - 2025-06-01");
        assert_eq!(
            draft.description.as_deref(),
            Some("Automatically generated quiz draft.")
        );
    }

    #[tokio::test]
    async fn test_invalid_draft_is_rejected() {
        let provider = CannedProvider(r#"{"questions": []}"#.to_string());
        let err = draft_quiz(Some(&provider as &dyn LlmProvider), day(), "x").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "AI generated invalid quiz: Quiz must have exactly 10 questions. Found 0."
        );
    }
}
