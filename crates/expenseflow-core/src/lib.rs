//! ExpenseFlow Core Library
//!
//! Turns free-text expense notes into a budget report:
//! - Extraction of amounts from text (pattern, then local inference)
//! - Keyword categorization into a fixed category set
//! - Optional market-price enrichment through web search
//! - Deterministic budget analysis (projection, status, trends)
//! - Guidance with prioritized actions and goals
//! - Model router for task-based fast/accurate model selection
//! - Prompt library for customizable AI prompts
//! - JSON snapshot store for records and analyses

pub mod ai;
pub mod categorize;
pub mod config;
pub mod error;
pub mod model_router;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod search;
pub mod store;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIBackend, AIClient, BackendInfo, GenerateRequest, InferenceClient, MockBackend,
    OllamaBackend, OpenAICompatibleBackend,
};
pub use categorize::categorize;
pub use config::{EnrichmentConfig, PipelineConfig, StorageConfig};
pub use error::{Error, Result};
pub use model_router::{BackendId, ModelRouter, ModelStrategy, RouterConfig, TaskCategory};
pub use models::{
    ActionItem, ActionPriority, AnalysisResult, BudgetStatus, ExpenseCategory, ExpenseRecord,
    ExtractionSource, Goal, Guidance, GuidanceSource, PipelineReport,
};
pub use pipeline::{AnalyzeRequest, PipelineCoordinator};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use search::{MockSearch, SearchBackend, SearchClient, SearchHit};
pub use store::{JsonFileStore, SnapshotStore};
