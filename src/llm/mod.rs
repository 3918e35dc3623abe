pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::config::{Config, ProviderKind};

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no API key configured for {provider}")]
    NoCredential { provider: &'static str },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("request to LLM API failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("LLM API request timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM API rejected credentials ({status}): {body}")]
    Auth { status: u16, body: String },

    #[error("LLM API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode LLM API response: {0}")]
    Decode(String),

    #[error("LLM API returned no completion text")]
    EmptyCompletion,
}

impl ProviderError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(timeout)
        } else {
            ProviderError::Transport(err)
        }
    }

    fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => ProviderError::Auth {
                status: status.as_u16(),
                body,
            },
            code => ProviderError::Status { status: code, body },
        }
    }
}

/// Sampling and transport limits shared by every backend.
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl GenerationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn http_client(&self) -> Result<reqwest::Client, ProviderError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProviderError::HttpClient)
    }
}

/// A text-completion backend: one prompt in, raw completion text out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the completion text unvalidated. Empty text is an error.
    async fn send(&self, prompt: &str) -> Result<String, ProviderError>;

    fn has_credential(&self) -> bool;

    fn name(&self) -> &'static str;

    fn model(&self) -> &str;
}

/// The backend chosen for this deployment.
#[derive(Debug, Clone)]
pub enum Provider {
    OpenAi(OpenAiClient),
    Gemini(GeminiClient),
}

impl Provider {
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let settings = GenerationSettings::from_config(config);
        let provider = match config.provider {
            ProviderKind::OpenAi => {
                Provider::OpenAi(OpenAiClient::new(&config.openai, settings)?)
            }
            ProviderKind::Gemini => {
                Provider::Gemini(GeminiClient::new(&config.gemini, settings)?)
            }
        };
        Ok(provider)
    }
}

#[async_trait]
impl CompletionProvider for Provider {
    async fn send(&self, prompt: &str) -> Result<String, ProviderError> {
        match self {
            Provider::OpenAi(client) => client.send(prompt).await,
            Provider::Gemini(client) => client.send(prompt).await,
        }
    }

    fn has_credential(&self) -> bool {
        match self {
            Provider::OpenAi(client) => client.has_credential(),
            Provider::Gemini(client) => client.has_credential(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi(client) => client.name(),
            Provider::Gemini(client) => client.name(),
        }
    }

    fn model(&self) -> &str {
        match self {
            Provider::OpenAi(client) => client.model(),
            Provider::Gemini(client) => client.model(),
        }
    }
}
