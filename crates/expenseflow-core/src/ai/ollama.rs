//! Ollama backend implementation
//!
//! Talks to the Ollama HTTP API (`/api/generate`, non-streaming). The model
//! is chosen per call by the caller; this client only knows the server.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::types::GenerateRequest;
use super::AIBackend;

/// Default Ollama endpoint
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Ollama HTTP backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from environment variables
    ///
    /// Uses `OLLAMA_HOST` (or the older `OLLAMA_BASE_URL`). Returns None if
    /// neither is set.
    pub fn from_env() -> Option<Self> {
        std::env::var("OLLAMA_HOST")
            .or_else(|_| std::env::var("OLLAMA_BASE_URL"))
            .ok()
            .filter(|h| !h.trim().is_empty())
            .map(|host| Self::new(&host))
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn generate(&self, request: &GenerateRequest, model: &str) -> Result<String> {
        let body = OllamaRequest {
            model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            stream: false,
            options: request
                .temperature
                .map(|temperature| OllamaOptions { temperature }),
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::BackendUnavailable(format!(
                "Ollama returned {}: {}",
                status, text
            )));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!(model = model, chars = ollama_response.response.len(), "Ollama response");

        Ok(ollama_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn host(&self) -> &str {
        &self.base_url
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
