/*!
 * Translation client: one chunk in, one result out.
 *
 * Wraps the remote provider with prompt construction and a bounded retry
 * loop. A chunk that still fails after the last attempt becomes a sentinel
 * result tagged `failed` instead of an error, so one bad chunk can never
 * take down the whole pipeline.
 */

use std::sync::Arc;
use std::time::Duration;

use log::error;

use crate::chunker::Chunk;
use crate::providers::{ProviderRequest, TranslateProvider};

/// Source-language value that requests auto-detection from the model.
pub const AUTO_SOURCE_LANGUAGE: &str = "auto";

/// Result of translating one chunk, correlated to its [`Chunk`] by `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    /// Ordinal of the source chunk.
    pub id: usize,
    /// The chunk text that was sent for translation.
    pub original_text: String,
    /// Translated text, or the sentinel message when `failed` is set.
    pub translated_text: String,
    /// Copied from the source chunk, consumed by the reassembler.
    pub has_prefix_context: bool,
    /// Copied from the source chunk, consumed by the reassembler.
    pub context_size: usize,
    /// Whether every translate attempt failed.
    pub failed: bool,
}

/// Tunable knobs for the translation client.
#[derive(Debug, Clone)]
pub struct TranslatorOptions {
    /// Sampling temperature; low for consistent translations.
    pub temperature: f32,

    /// Completion token cap per request.
    pub max_tokens: u32,

    /// Total attempts per chunk, first try included.
    pub max_retries: u32,

    /// Base backoff between attempts; doubled when rate limited.
    pub retry_delay: Duration,
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 8000,
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Delay before the next attempt.
///
/// Constant per attempt rather than exponential: the remote service meters in
/// requests per minute, and a rate-limit response already waits twice the
/// base delay. The attempt number is accepted so alternative policies can
/// slot in without changing the call site.
pub fn backoff_delay(_attempt: u32, rate_limited: bool, retry_delay: Duration) -> Duration {
    if rate_limited {
        retry_delay * 2
    } else {
        retry_delay
    }
}

/// Stateless translation client for single chunks.
#[derive(Debug, Clone)]
pub struct Translator {
    provider: Arc<dyn TranslateProvider>,
    options: TranslatorOptions,
}

impl Translator {
    /// Create a client over the given provider with default options.
    pub fn new(provider: Arc<dyn TranslateProvider>) -> Self {
        Self::with_options(provider, TranslatorOptions::default())
    }

    /// Create a client with explicit options.
    pub fn with_options(provider: Arc<dyn TranslateProvider>, options: TranslatorOptions) -> Self {
        Self { provider, options }
    }

    /// Translate one chunk, retrying transient failures.
    ///
    /// Never returns an error: after `max_retries` failed attempts the result
    /// carries the sentinel text embedding the chunk id and `failed = true`.
    pub async fn translate_chunk(
        &self,
        chunk: &Chunk,
        source_lang: &str,
        target_lang: &str,
        instructions: Option<&str>,
    ) -> TranslationResult {
        let request = ProviderRequest {
            system_prompt: build_system_prompt(source_lang, target_lang, instructions),
            user_prompt: build_user_prompt(chunk),
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        };

        let mut attempt = 0;
        while attempt < self.options.max_retries {
            attempt += 1;
            match self.provider.translate(request.clone()).await {
                Ok(translated_text) => {
                    return TranslationResult {
                        id: chunk.id,
                        original_text: chunk.text.clone(),
                        translated_text,
                        has_prefix_context: chunk.has_prefix_context,
                        context_size: chunk.context_size,
                        failed: false,
                    };
                }
                Err(e) => {
                    error!(
                        "Chunk {} attempt {}/{} failed: {}",
                        chunk.id, attempt, self.options.max_retries, e
                    );
                    if attempt < self.options.max_retries {
                        let delay = backoff_delay(attempt, e.is_rate_limited(), self.options.retry_delay);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        TranslationResult {
            id: chunk.id,
            original_text: chunk.text.clone(),
            translated_text: format!("[TRANSLATION ERROR] Failed to translate chunk {}", chunk.id),
            has_prefix_context: chunk.has_prefix_context,
            context_size: chunk.context_size,
            failed: true,
        }
    }
}

/// Build the system instruction.
///
/// Custom instructions win; otherwise a literary-translation default keyed by
/// whether the source language is auto-detected.
fn build_system_prompt(source_lang: &str, target_lang: &str, instructions: Option<&str>) -> String {
    if let Some(custom) = instructions {
        if !custom.trim().is_empty() {
            return custom.to_string();
        }
    }

    if source_lang == AUTO_SOURCE_LANGUAGE {
        format!(
            "You are a professional literary translator. \
             Translate the following text into {}. \
             Preserve the original style, tone and literary quality. \
             Preserve paragraph breaks and formatting.",
            target_lang
        )
    } else {
        format!(
            "You are a professional literary translator. \
             Translate the following text from {} to {}. \
             Preserve the original style, tone and literary quality. \
             Preserve paragraph breaks and formatting.",
            source_lang, target_lang
        )
    }
}

/// Build the user message, with the context disclaimer for prefixed chunks.
///
/// The disclaimer is a soft instruction to the model, not an enforced
/// contract; the reassembler still strips whatever overlap comes back.
fn build_user_prompt(chunk: &Chunk) -> String {
    if chunk.has_prefix_context {
        format!(
            "This text is part of a larger document. The first part (approximately {} tokens) \
             is provided only as context and has already been translated.\n\n\
             Translate only the NEW content that follows the context part, keeping consistency \
             with the style and terminology established in the context part.\n\n\
             Text: {}",
            chunk.context_size, chunk.text
        )
    } else {
        format!("Text: {}", chunk.text)
    }
}
