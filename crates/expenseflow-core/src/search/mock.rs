//! Mock search backend for testing

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::{SearchBackend, SearchHit};

/// Scripted search backend
///
/// Results, failures and delays are keyed by a substring of the query. Queries
/// without a scripted result return no hits.
#[derive(Clone, Default)]
pub struct MockSearch {
    results: HashMap<String, Vec<SearchHit>>,
    failures: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    calls: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<String>>>,
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, query: &str) -> Option<&'a T> {
    map.iter()
        .filter(|(needle, _)| query.contains(needle.as_str()))
        // Longest needle wins so "laptop çantası" beats "laptop"
        .max_by_key(|(needle, _)| needle.len())
        .map(|(_, value)| value)
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, needle: &str, hits: Vec<SearchHit>) -> Self {
        self.results.insert(needle.to_string(), hits);
        self
    }

    pub fn with_failure(mut self, needle: &str, message: &str) -> Self {
        self.failures.insert(needle.to_string(), message.to_string());
        self
    }

    pub fn with_delay(mut self, needle: &str, delay: Duration) -> Self {
        self.delays.insert(needle.to_string(), delay);
        self
    }

    /// Number of searches so far (shared between clones)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queries received so far, in arrival order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchBackend for MockSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }

        if let Some(delay) = lookup(&self.delays, query) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(message) = lookup(&self.failures, query) {
            return Err(Error::BackendUnavailable(message.clone()));
        }

        Ok(lookup(&self.results, query).cloned().unwrap_or_default())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
