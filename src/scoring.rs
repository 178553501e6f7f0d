// src/scoring.rs
//! Quiz structure validation, answer scoring and multi-attempt roll-up.
//!
//! Everything in here is pure: no I/O, no shared state. Handlers call these
//! functions before persisting anything.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{
    Answer, AnswerType, CanonicalAnswer, Classification, Outcome, Question, QuizContent, Score,
    ScoredResult,
};

pub const QUESTIONS_PER_QUIZ: usize = 10;
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Order in which tied aggregate counts are resolved; earlier wins.
pub const AGGREGATE_PRIORITY: [Outcome; 3] =
    [Outcome::InCharge, Outcome::InControl, Outcome::Balanced];

/// First structural rule a quiz breaks. Question numbers are 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("Questions array is missing or invalid.")]
    MissingQuestions,

    #[error("Quiz must have exactly 10 questions. Found {found}.")]
    QuestionCount { found: usize },

    #[error("Question {question} must have exactly 4 options. Found {found}.")]
    OptionCount { question: usize, found: usize },

    #[error("Question {question} must have exactly 1 'In-Charge' option. Found {found}.")]
    InChargeCount { question: usize, found: usize },

    #[error("Question {question} must have exactly 3 'In-Control' options. Found {found}.")]
    InControlCount { question: usize, found: usize },

    #[error("Language '{language}': {source}")]
    InLanguage {
        language: String,
        source: Box<StructureError>,
    },
}

/// Serializable verdict returned to admin tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub error: Option<String>,
}

impl From<&Result<(), StructureError>> for ValidationReport {
    fn from(result: &Result<(), StructureError>) -> Self {
        match result {
            Ok(()) => ValidationReport { valid: true, error: None },
            Err(e) => ValidationReport {
                valid: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Checks the question/option shape of one language version of a quiz.
pub fn validate(questions: &[Question]) -> Result<(), StructureError> {
    if questions.len() != QUESTIONS_PER_QUIZ {
        return Err(StructureError::QuestionCount {
            found: questions.len(),
        });
    }

    for (i, q) in questions.iter().enumerate() {
        let question = i + 1;

        if q.options.len() != OPTIONS_PER_QUESTION {
            return Err(StructureError::OptionCount {
                question,
                found: q.options.len(),
            });
        }

        let mut in_charge = 0;
        let mut in_control = 0;
        for opt in &q.options {
            match opt.answer_type.answer_type() {
                Some(AnswerType::InCharge) => in_charge += 1,
                Some(AnswerType::InControl) => in_control += 1,
                None => {}
            }
        }

        if in_charge != 1 {
            return Err(StructureError::InChargeCount {
                question,
                found: in_charge,
            });
        }

        // Not implied by the previous check: unknown labels may be present.
        if in_control != 3 {
            return Err(StructureError::InControlCount {
                question,
                found: in_control,
            });
        }
    }

    Ok(())
}

/// Validates every language version. The language is named in the error
/// only when the quiz carries more than one.
pub fn validate_content(content: &BTreeMap<String, QuizContent>) -> Result<(), StructureError> {
    if content.is_empty() {
        return Err(StructureError::MissingQuestions);
    }
    let multilingual = content.len() > 1;
    for (language, version) in content {
        if let Err(e) = validate(&version.questions) {
            if multilingual {
                return Err(StructureError::InLanguage {
                    language: language.clone(),
                    source: Box::new(e),
                });
            }
            return Err(e);
        }
    }
    Ok(())
}

/// Lower-cases and keeps only `a`..=`z`.
pub fn normalize_label(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect()
}

/// Maps a raw client label onto a canonical one. Unrecognized input counts as
/// In-Charge (see DESIGN.md, open question on the fallback).
pub fn classify(raw: &str) -> AnswerType {
    let normalized = normalize_label(raw);
    if normalized.contains("charge") {
        AnswerType::InCharge
    } else if normalized.contains("control") {
        AnswerType::InControl
    } else {
        log::warn!("Unrecognized answer label {:?}; counting it as In-Charge", raw);
        AnswerType::InCharge
    }
}

pub fn outcome_for(score: Score) -> Outcome {
    if score.in_charge > score.in_control {
        Outcome::InCharge
    } else if score.in_control > score.in_charge {
        Outcome::InControl
    } else {
        Outcome::Balanced
    }
}

/// Scores a submission. Total: every answer lands in one of the two buckets.
pub fn score(answers: &[Answer]) -> ScoredResult {
    let mut score = Score::default();
    let responses: Vec<CanonicalAnswer> = answers
        .iter()
        .map(|answer| {
            let answer_type = classify(&answer.answer_type);
            match answer_type {
                AnswerType::InCharge => score.in_charge += 1,
                AnswerType::InControl => score.in_control += 1,
            }
            CanonicalAnswer {
                question_id: answer.question_id.clone(),
                answer_type,
            }
        })
        .collect();

    ScoredResult {
        score,
        outcome: outcome_for(score),
        responses,
    }
}

/// Overall classification of a user from their per-attempt outcomes.
pub fn aggregate(outcomes: &[Outcome]) -> Classification {
    let count = |wanted: Outcome| outcomes.iter().filter(|o| **o == wanted).count();

    let in_charge = count(Outcome::InCharge);
    if in_charge > 0 && in_charge == count(Outcome::InControl) {
        return Classification::Balanced;
    }

    let mut best = None;
    let mut max = 0;
    for candidate in AGGREGATE_PRIORITY {
        let n = count(candidate);
        if n > max {
            max = n;
            best = Some(candidate);
        }
    }

    best.map(Classification::from)
        .unwrap_or(Classification::Unassessed)
}
