/*!
 * Provider implementations for the remote translation service.
 *
 * The translation capability is an opaque remote chat-completion API. This
 * module defines the seam the rest of the pipeline talks through, and the
 * DeepSeek client implementation:
 * - `providers::deepseek`: DeepSeek API client (OpenAI-compatible)
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One prepared chat-completion request, provider-agnostic.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// System instruction guiding the translation.
    pub system_prompt: String,
    /// User message carrying the chunk text (and context disclaimer).
    pub user_prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token cap.
    pub max_tokens: u32,
}

/// Common trait for remote translation providers.
///
/// One invocation is exactly one remote call; retry policy lives in the
/// translation client, not here. Object-safe so tests can inject mocks.
#[async_trait]
pub trait TranslateProvider: Send + Sync + Debug {
    /// Complete one request, returning the translated text.
    async fn translate(&self, request: ProviderRequest) -> Result<String, ProviderError>;
}

pub mod deepseek;
