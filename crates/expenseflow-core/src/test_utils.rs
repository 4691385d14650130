//! Test utilities for expenseflow-core
//!
//! A mock Ollama server speaking just enough of the HTTP API
//! (`/api/generate`, `/api/tags`) for backend and integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Prices the mock "knows" for notes without an amount
const KNOWN_PRICES: &[(&str, f64)] = &[
    ("laptop", 25000.0),
    ("kulaklık", 1500.0),
    ("netflix", 229.99),
];

const GUIDANCE_REPLY: &str = "Spending is under control for the analyzed period and there is room to save.\n\
\n\
1. Keep recording every expense\n\
2. Move part of the remaining budget into savings\n\
3. Review subscriptions once a month";

#[derive(Clone, Default)]
struct ServerState {
    models: Arc<Mutex<Vec<String>>>,
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    state: ServerState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state = ServerState::default();
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Models named in generate requests, in arrival order
    pub fn models_used(&self) -> Vec<String> {
        self.state.models.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

/// Ollama tags endpoint (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![
            ModelInfo {
                name: "llama3.2:3b".to_string(),
                size: 2_000_000_000,
            },
            ModelInfo {
                name: "llama3.1:8b".to_string(),
                size: 4_900_000_000,
            },
        ],
    })
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<ServerState>,
    Json(request): Json<GenerateRequest>,
) -> Json<GenerateResponse> {
    state.models.lock().unwrap().push(request.model.clone());

    // Matches the user section of prompts/parse_expense.md
    let response = match expense_note(&request.prompt) {
        Some(note) => parse_expense_mock(note),
        None => GUIDANCE_REPLY.to_string(),
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
}

fn expense_note(prompt: &str) -> Option<&str> {
    let marker = "Expense note: \"";
    let start = prompt.find(marker)? + marker.len();
    let rest = &prompt[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Known price, else the first number in the note, else 0
fn parse_expense_mock(note: &str) -> String {
    let lower = note.to_lowercase();
    let amount = KNOWN_PRICES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, price)| *price)
        .or_else(|| {
            note.split_whitespace()
                .find_map(|word| word.replace(',', ".").parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    serde_json::json!({ "description": note.trim(), "amount": amount }).to_string()
}
