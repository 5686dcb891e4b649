/*!
 * Tests for the per-chunk translation client
 */

use std::sync::Arc;
use std::time::Duration;

use doctrans::chunker::Chunk;
use doctrans::translator::{Translator, TranslatorOptions};

use crate::common::mock_providers::MockProvider;

fn test_chunk(id: usize) -> Chunk {
    Chunk {
        id,
        text: format!("chunk body {}", id),
        token_start: 0,
        token_end: 0,
        is_first: id == 0,
        is_last: false,
        has_prefix_context: id > 0,
        context_size: if id > 0 { 100 } else { 0 },
    }
}

/// Options with zeroed backoff so retry tests run instantly
fn fast_options() -> TranslatorOptions {
    TranslatorOptions {
        retry_delay: Duration::ZERO,
        ..TranslatorOptions::default()
    }
}

#[tokio::test]
async fn test_translate_chunk_withEchoProvider_shouldReturnIdentity() {
    let provider = Arc::new(MockProvider::echo());
    let translator = Translator::with_options(provider.clone(), fast_options());

    let chunk = test_chunk(0);
    let result = translator.translate_chunk(&chunk, "en", "fr", None).await;

    assert!(!result.failed);
    assert_eq!(result.id, 0);
    assert_eq!(result.translated_text, chunk.text);
    assert_eq!(result.original_text, chunk.text);
    assert_eq!(result.has_prefix_context, chunk.has_prefix_context);
    assert_eq!(result.context_size, chunk.context_size);
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_translate_chunk_withTransientFailures_shouldRetryAndSucceed() {
    let provider = Arc::new(MockProvider::succeed_after(2));
    let translator = Translator::with_options(provider.clone(), fast_options());

    let chunk = test_chunk(3);
    let result = translator.translate_chunk(&chunk, "en", "fr", None).await;

    assert!(!result.failed);
    assert_eq!(result.translated_text, chunk.text);
    assert_eq!(provider.request_count(), 3, "two failures then one success");
}

#[tokio::test]
async fn test_translate_chunk_withPersistentFailure_shouldReturnSentinel() {
    let provider = Arc::new(MockProvider::failing());
    let translator = Translator::with_options(provider.clone(), fast_options());

    let chunk = test_chunk(7);
    let result = translator.translate_chunk(&chunk, "en", "fr", None).await;

    assert!(result.failed);
    assert!(
        result.translated_text.contains("chunk 7"),
        "sentinel must embed the chunk id: {}",
        result.translated_text
    );
    assert_eq!(provider.request_count(), 3, "default cap is three attempts");
}

#[tokio::test]
async fn test_translate_chunk_withAllRateLimited_shouldReturnSentinelWithoutRaising() {
    let provider = Arc::new(MockProvider::rate_limited());
    let translator = Translator::with_options(provider.clone(), fast_options());

    let chunk = test_chunk(5);
    let result = translator.translate_chunk(&chunk, "auto", "ru", None).await;

    assert!(result.failed);
    assert!(result.translated_text.contains("chunk 5"));
    assert_eq!(provider.request_count(), 3);
}

#[tokio::test]
async fn test_translate_chunk_withCustomRetryCount_shouldStopAtCap() {
    let provider = Arc::new(MockProvider::failing());
    let options = TranslatorOptions {
        max_retries: 5,
        retry_delay: Duration::ZERO,
        ..TranslatorOptions::default()
    };
    let translator = Translator::with_options(provider.clone(), options);

    let result = translator.translate_chunk(&test_chunk(0), "en", "de", None).await;

    assert!(result.failed);
    assert_eq!(provider.request_count(), 5);
}
