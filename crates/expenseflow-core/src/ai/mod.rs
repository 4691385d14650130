//! Pluggable local AI backend abstraction
//!
//! # Architecture
//!
//! - `AIBackend` trait: one operation, `generate`, plus health/identity
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//! - `InferenceClient`: routes a task to a model, renders prompts and applies
//!   the per-backend timeout
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, openai_compatible, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)
//!
//! Model names come from the [`crate::model_router::ModelRouter`], not from
//! the backend.

mod inference;
mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use inference::InferenceClient;
pub use mock::MockBackend;
pub use ollama::{OllamaBackend, DEFAULT_OLLAMA_HOST};
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for all AI backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Generate text for a request using the given model
    async fn generate(&self, request: &GenerateRequest, model: &str) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;

    /// Short backend name (for logging)
    fn name(&self) -> &'static str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (Docker Model Runner, vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use. Returns None if
    /// the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            "none" | "off" => None,
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Health and identity for display
    pub async fn info(&self) -> BackendInfo {
        BackendInfo {
            name: self.name(),
            host: self.host().to_string(),
            healthy: self.health_check().await,
        }
    }
}

#[async_trait]
impl AIBackend for AIClient {
    async fn generate(&self, request: &GenerateRequest, model: &str) -> Result<String> {
        match self {
            AIClient::Ollama(b) => b.generate(request, model).await,
            AIClient::OpenAICompatible(b) => b.generate(request, model).await,
            AIClient::Mock(b) => b.generate(request, model).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AIClient::Ollama(b) => b.name(),
            AIClient::OpenAICompatible(b) => b.name(),
            AIClient::Mock(b) => b.name(),
        }
    }
}
