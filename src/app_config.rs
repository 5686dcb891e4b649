use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO), or "auto" for auto-detection
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Chunking config
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Configuration for document chunking
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Maximum chunk size in tokens
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Carry-over context size in tokens, must be smaller than chunk_size
    #[serde(default = "default_context_size")]
    pub context_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            context_size: default_context_size(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Remote provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            common: TranslationCommonConfig::default(),
        }
    }
}

/// Remote provider configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key; when empty the DEEPSEEK_API_KEY environment variable is used
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: String::new(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Common translation settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Custom translation instructions replacing the default system prompt
    #[serde(default)]
    pub instructions: Option<String>,

    /// Maximum number of simultaneous in-flight requests
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Attempts per chunk, first try included
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff between attempts in seconds, doubled on rate limits
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make translations more consistent
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token cap per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            instructions: None,
            max_parallel: default_max_parallel(),
            retry_count: default_retry_count(),
            retry_delay_secs: default_retry_delay_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the log crate's filter type
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "auto".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_chunk_size() -> usize {
    4000
}

fn default_context_size() -> usize {
    1000
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_endpoint() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_parallel() -> usize {
    40
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    8000
}

/// Environment variable consulted when the config carries no API key
pub const API_KEY_ENV_VAR: &str = "DEEPSEEK_API_KEY";

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        language_utils::validate_source_language(&self.source_language)?;
        language_utils::validate_target_language(&self.target_language)?;

        // Validate chunking parameters
        if self.chunking.chunk_size == 0 || self.chunking.context_size == 0 {
            return Err(anyhow!("chunk_size and context_size must be positive"));
        }
        if self.chunking.context_size >= self.chunking.chunk_size {
            return Err(anyhow!(
                "context_size ({}) must be smaller than chunk_size ({})",
                self.chunking.context_size,
                self.chunking.chunk_size
            ));
        }

        if self.translation.common.retry_count == 0 {
            return Err(anyhow!("retry_count must be at least 1"));
        }

        // Validate the provider endpoint
        Url::parse(&self.translation.provider.endpoint).with_context(|| {
            format!("Invalid provider endpoint: {}", self.translation.provider.endpoint)
        })?;

        Ok(())
    }

    /// Resolve the API key from the config or the environment.
    ///
    /// A missing key is fatal at dispatch start, before any network call.
    pub fn resolve_api_key(&self) -> Result<String> {
        if !self.translation.provider.api_key.is_empty() {
            return Ok(self.translation.provider.api_key.clone());
        }
        match std::env::var(API_KEY_ENV_VAR) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(anyhow!(
                "DeepSeek API key not found. Set it in the config file or the {} environment variable",
                API_KEY_ENV_VAR
            )),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            chunking: ChunkingConfig::default(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
