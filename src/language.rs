// src/language.rs

/// Language used when a quiz or request doesn't say otherwise.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Full-word keys found in older quiz documents, mapped to ISO 639-1 codes.
const LEGACY_KEYS: &[(&str, &str)] = &[
    ("english", "en"),
    ("hindi", "hi"),
    ("marathi", "mr"),
    ("gujarati", "gu"),
    ("tamil", "ta"),
    ("telugu", "te"),
    ("kannada", "kn"),
    ("malayalam", "ml"),
    ("bengali", "bn"),
    ("punjabi", "pa"),
];

/// Normalizes a language key to its lower-case ISO code. Blank input maps to
/// the default language; unknown keys are lower-cased and passed through.
pub fn normalize(raw: &str) -> String {
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        return DEFAULT_LANGUAGE.to_string();
    }
    LEGACY_KEYS
        .iter()
        .find(|(legacy, _)| *legacy == key)
        .map(|(_, code)| code.to_string())
        .unwrap_or(key)
}

/// Human-facing name for a language code, used by analytics.
pub fn display_name(code: &str) -> String {
    LEGACY_KEYS
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(legacy, _)| capitalize(legacy))
        .unwrap_or_else(|| capitalize(code))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
