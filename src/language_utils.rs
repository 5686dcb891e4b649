use anyhow::{Result, anyhow};
use isolang::Language;

use crate::translator::AUTO_SOURCE_LANGUAGE;

/// Language utilities for ISO language code handling
///
/// The pipeline accepts ISO 639-1 (2-letter) and ISO 639-3 (3-letter) codes,
/// plus the special value `auto` for source-language auto-detection by the
/// remote model.
/// Whether the code requests source-language auto-detection
pub fn is_auto(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(AUTO_SOURCE_LANGUAGE)
}

/// Parse a language code into an isolang Language
fn parse_language(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => Language::from_639_3(&normalized),
        _ => None,
    }
}

/// Validate a source-language argument (`auto` is allowed)
pub fn validate_source_language(code: &str) -> Result<()> {
    if is_auto(code) {
        return Ok(());
    }
    parse_language(code)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid source language code: {}", code))
}

/// Validate a target-language argument (`auto` is not a target)
pub fn validate_target_language(code: &str) -> Result<()> {
    if is_auto(code) {
        return Err(anyhow!("Target language cannot be '{}'", AUTO_SOURCE_LANGUAGE));
    }
    parse_language(code)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid target language code: {}", code))
}

/// Get the English language name for a code, for prompts and logs
///
/// `auto` passes through unchanged so prompt construction can key on it.
pub fn get_language_name(code: &str) -> Result<String> {
    if is_auto(code) {
        return Ok(AUTO_SOURCE_LANGUAGE.to_string());
    }
    parse_language(code)
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Failed to get language name from code: {}", code))
}
