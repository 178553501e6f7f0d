// src/import.rs
//! Plain-text quiz import.
//!
//! ```text
//! 1. Question text here
//! A. Option text – 0
//! B. Option text – 4
//! C. Option text – 9
//! D. Option text – 2
//! ```
//!
//! Each option may end with a score after a hyphen, en dash or em dash.
//! Scores above [`IN_CHARGE_THRESHOLD`] mark the In-Charge option; missing
//! scores count as 0.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{AnswerOption, AnswerType, Question};

pub const IN_CHARGE_THRESHOLD: u32 = 7;

static INLINE_OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s([A-D]\.\s)").expect("inline option pattern is valid"));
static QUESTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s+(.+)$").expect("question pattern is valid"));
static OPTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-D]\.\s+").expect("option pattern is valid"));
static TRAILING_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)[-\x{2013}\x{2014}]\s*(\d+)\s*$").expect("score pattern is valid")
});

/// Parses pasted text into questions. Lines that are neither a numbered
/// question nor an `A.`–`D.` option of a question are ignored; the result is
/// not validated.
pub fn parse_quiz_text(text: &str) -> Vec<Question> {
    // Options pasted on a single line get split onto their own lines.
    let formatted = INLINE_OPTION.replace_all(text, "\n$1");

    let mut questions = Vec::new();
    let mut current: Option<Question> = None;

    for line in formatted.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = QUESTION_LINE.captures(line) {
            if let Some(done) = current.take() {
                questions.push(done);
            }
            current = Some(Question {
                id: String::new(),
                question_text: caps[1].trim().to_string(),
                options: Vec::new(),
            });
        } else if let Some(question) = current.as_mut() {
            if OPTION_PREFIX.is_match(line) {
                question.options.push(parse_option(line));
            }
        }
    }

    if let Some(done) = current {
        questions.push(done);
    }
    questions
}

fn parse_option(line: &str) -> AnswerOption {
    let (body, score) = match TRAILING_SCORE.captures(line) {
        Some(caps) => (
            caps[1].trim().to_string(),
            caps[2].parse::<u32>().unwrap_or(0),
        ),
        None => (line.to_string(), 0),
    };

    let text = OPTION_PREFIX.replace(&body, "").trim().to_string();
    let answer_type = if score > IN_CHARGE_THRESHOLD {
        AnswerType::InCharge
    } else {
        AnswerType::InControl
    };

    AnswerOption {
        text,
        answer_type: answer_type.into(),
    }
}
