use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{ProviderRequest, TranslateProvider};

/// DeepSeek client for the chat-completions API (OpenAI-compatible)
#[derive(Debug)]
pub struct DeepSeek {
    /// HTTP client for API requests, pooled and shared by all chunk tasks
    client: Client,
    /// API key for bearer authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
    /// Model identifier
    model: String,
}

/// DeepSeek chat-completion request
#[derive(Debug, Serialize)]
pub struct DeepSeekRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<ChatMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Chat message format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u32,
    /// Number of completion tokens
    pub completion_tokens: u32,
}

/// DeepSeek chat-completion response
#[derive(Debug, Deserialize)]
pub struct DeepSeekResponse {
    /// Completion choices; the first one carries the translation
    pub choices: Vec<DeepSeekChoice>,
    /// Token usage information, when reported
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// Individual completion choice
#[derive(Debug, Deserialize)]
pub struct DeepSeekChoice {
    /// The completion message
    pub message: ChatMessage,
}

impl DeepSeekRequest {
    /// Create a new request for the given model
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl DeepSeek {
    /// Create a new DeepSeek client.
    ///
    /// Uses connection pooling so all concurrent chunk tasks reuse the same
    /// underlying connections instead of opening one per request.
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .pool_idle_timeout(Duration::from_secs(90))
                .pool_max_idle_per_host(20)
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    /// Complete a chat request with a single API call
    pub async fn complete(&self, request: DeepSeekRequest) -> Result<DeepSeekResponse, ProviderError> {
        let api_url = if self.endpoint.is_empty() {
            "https://api.deepseek.com/v1/chat/completions".to_string()
        } else {
            format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
        };

        let response = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("request to DeepSeek API failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("DeepSeek API error ({}): {}", status, error_text);
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(error_text),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderError::AuthenticationError(error_text)
                }
                _ => ProviderError::ApiError {
                    status_code: status.as_u16(),
                    message: error_text,
                },
            });
        }

        response
            .json::<DeepSeekResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("invalid DeepSeek API response: {}", e)))
    }

    /// Extract the completion text from a response
    pub fn extract_text(response: &DeepSeekResponse) -> Result<String, ProviderError> {
        response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::ParseError("response contained no choices".to_string()))
    }
}

#[async_trait]
impl TranslateProvider for DeepSeek {
    async fn translate(&self, request: ProviderRequest) -> Result<String, ProviderError> {
        let api_request = DeepSeekRequest::new(&self.model, request.max_tokens)
            .add_message("system", request.system_prompt)
            .add_message("user", request.user_prompt)
            .temperature(request.temperature);

        let response = self.complete(api_request).await?;
        Self::extract_text(&response)
    }
}
