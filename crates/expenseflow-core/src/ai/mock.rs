//! Mock backend for testing
//!
//! Replies are scripted by prompt substring: the first rule whose needle
//! appears in the prompt decides the reply, otherwise the default reply is
//! used. Failures and delays can be scripted the same way, and every call is
//! counted so tests can assert that a code path never reached inference.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::GenerateRequest;
use super::AIBackend;

/// Canned guidance returned when nothing else matches
const DEFAULT_REPLY: &str = "Your spending pattern is stable for the analyzed period.\n\
1. Keep recording every expense\n\
2. Review recurring payments once a month";

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail(String),
}

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    rules: Vec<(String, MockReply)>,
    default_reply: MockReply,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    models: Arc<Mutex<Vec<String>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            rules: Vec::new(),
            default_reply: MockReply::Text(DEFAULT_REPLY.to_string()),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            models: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Unhealthy backend whose every call fails
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
        .failing("backend offline")
    }

    /// Reply with `response` when the prompt contains `needle`
    pub fn with_response(mut self, needle: &str, response: &str) -> Self {
        self.rules
            .push((needle.to_string(), MockReply::Text(response.to_string())));
        self
    }

    /// Fail when the prompt contains `needle`
    pub fn with_failure(mut self, needle: &str, message: &str) -> Self {
        self.rules
            .push((needle.to_string(), MockReply::Fail(message.to_string())));
        self
    }

    /// Reply used when no rule matches
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_reply = MockReply::Text(response.to_string());
        self
    }

    /// Make unmatched calls fail
    pub fn failing(mut self, message: &str) -> Self {
        self.default_reply = MockReply::Fail(message.to_string());
        self
    }

    /// Sleep before every reply (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `generate` calls so far (shared between clones)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Models requested so far, in call order
    pub fn models_used(&self) -> Vec<String> {
        self.models.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate(&self, request: &GenerateRequest, model: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut models) = self.models.lock() {
            models.push(model.to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.default_reply);

        match reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Fail(message) => Err(Error::BackendUnavailable(message.clone())),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
