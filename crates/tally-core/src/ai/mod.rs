//! Pluggable text-generation provider abstraction
//!
//! This module provides a backend-agnostic interface to a text-generation
//! provider. Higher-level operations (categorization, parsing, insights) live
//! in [`crate::assistant`] and only ever see a prompt going in and text coming out.
//!
//! # Architecture
//!
//! - `TextProvider` trait: `complete(prompt, temperature, max_tokens)` plus health info
//! - `ProviderClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAICompatibleBackend`, `OllamaBackend`, `MockProvider`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (openai_compatible, ollama, mock). Default: openai_compatible
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Default model name (default: llama3.2)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::{MockCall, MockProvider};
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Failure talking to the provider.
///
/// Never escapes [`crate::assistant::ExpenseAssistant`]; every variant is
/// absorbed into that operation's fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider call timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider rate limit or quota exceeded")]
    RateLimited,

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::InvalidResponse(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

impl ProviderError {
    /// Build an error from a non-success HTTP response
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            ProviderError::RateLimited
        } else {
            ProviderError::Status {
                status: status.as_u16(),
                body: parsing::truncate(&body, 200),
            }
        }
    }
}

/// Interface every text-generation backend implements
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate a completion for a single user prompt
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ProviderError>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete provider client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum ProviderClient {
    /// OpenAI-compatible chat completions API
    OpenAICompatible(OpenAICompatibleBackend),
    /// Ollama generate API
    Ollama(OllamaBackend),
    /// Scripted backend for tests and offline use
    Mock(MockProvider),
}

impl ProviderClient {
    /// Create a provider client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use. Returns None if
    /// the selected backend's host is not configured, in which case every
    /// assistant operation uses its local fallback.
    pub fn from_env() -> Option<Self> {
        let backend =
            std::env::var("AI_BACKEND").unwrap_or_else(|_| "openai_compatible".to_string());
        Self::from_env_named(&backend)
    }

    /// Create a specific backend, reading its settings from the environment
    pub fn from_env_named(backend: &str) -> Option<Self> {
        match backend.to_lowercase().as_str() {
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(ProviderClient::OpenAICompatible)
            }
            "ollama" => OllamaBackend::from_env().map(ProviderClient::Ollama),
            "mock" => Some(ProviderClient::Mock(MockProvider::new())),
            _ => {
                tracing::warn!(
                    backend = %backend,
                    "Unknown AI_BACKEND, falling back to openai_compatible"
                );
                OpenAICompatibleBackend::from_env().map(ProviderClient::OpenAICompatible)
            }
        }
    }

    /// Create a mock backend for testing
    pub fn mock(provider: MockProvider) -> Self {
        ProviderClient::Mock(provider)
    }

    /// Short backend name for status output
    pub fn backend_name(&self) -> &'static str {
        match self {
            ProviderClient::OpenAICompatible(_) => "openai_compatible",
            ProviderClient::Ollama(_) => "ollama",
            ProviderClient::Mock(_) => "mock",
        }
    }
}

// Implement TextProvider for ProviderClient by delegating to the inner backend
#[async_trait]
impl TextProvider for ProviderClient {
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        match self {
            ProviderClient::OpenAICompatible(b) => b.complete(prompt, temperature, max_tokens).await,
            ProviderClient::Ollama(b) => b.complete(prompt, temperature, max_tokens).await,
            ProviderClient::Mock(b) => b.complete(prompt, temperature, max_tokens).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            ProviderClient::OpenAICompatible(b) => b.health_check().await,
            ProviderClient::Ollama(b) => b.health_check().await,
            ProviderClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            ProviderClient::OpenAICompatible(b) => b.model(),
            ProviderClient::Ollama(b) => b.model(),
            ProviderClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            ProviderClient::OpenAICompatible(b) => b.host(),
            ProviderClient::Ollama(b) => b.host(),
            ProviderClient::Mock(b) => b.host(),
        }
    }
}
