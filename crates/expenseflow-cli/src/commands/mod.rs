//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Run the pipeline on expense notes
//! - `history` - Stored analyses and records (history, show, delete, expenses)
//! - `route` - Model routing table
//! - `prompts` - Prompt library commands
//! - `backends` - Backend health checks

pub mod analyze;
pub mod backends;
pub mod history;
pub mod prompts;
pub mod route;

// Re-export command functions for main.rs
pub use analyze::*;
pub use backends::*;
pub use history::*;
pub use prompts::*;
pub use route::*;

use std::path::PathBuf;

use anyhow::{anyhow, Context as _, Result};
use expenseflow_core::{
    model_router::ModelStrategy, prompts::default_prompts_dir, store::default_data_dir,
    JsonFileStore, ModelRouter, PipelineConfig, PromptLibrary,
};

/// Paths shared by all commands (from the global flags)
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub data_dir: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
}

impl Context {
    pub fn new(data_dir: Option<PathBuf>, config_dir: Option<PathBuf>) -> Self {
        Self {
            data_dir,
            config_dir,
        }
    }

    /// Resolved data directory
    pub fn data_dir(&self) -> Result<PathBuf> {
        self.data_dir
            .clone()
            .or_else(default_data_dir)
            .ok_or_else(|| anyhow!("Could not determine data directory, pass --data-dir"))
    }

    pub fn open_store(&self) -> Result<JsonFileStore> {
        let dir = self.data_dir()?;
        JsonFileStore::new(&dir)
            .with_context(|| format!("Failed to open data directory {}", dir.display()))
    }

    /// Router from `<config_dir>/models.toml` or the default location
    pub fn router(&self, strategy: Option<&str>) -> Result<ModelRouter> {
        let router = match &self.config_dir {
            Some(dir) => ModelRouter::with_config_path(dir.join("models.toml")),
            None => ModelRouter::new(),
        }
        .context("Failed to load model configuration")?;

        match strategy {
            Some(s) => Ok(router.with_strategy(parse_strategy(s)?)),
            None => Ok(router),
        }
    }

    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        match &self.config_dir {
            Some(dir) => PipelineConfig::load_from(&dir.join("pipeline.toml")),
            None => PipelineConfig::load(),
        }
        .context("Failed to load pipeline configuration")
    }

    pub fn prompt_library(&self) -> PromptLibrary {
        match &self.config_dir {
            Some(dir) => PromptLibrary::with_override_dir(dir.join("prompts")),
            None => PromptLibrary::new(),
        }
    }

    /// Where prompt overrides are read from
    pub fn prompts_dir(&self) -> Option<PathBuf> {
        match &self.config_dir {
            Some(dir) => Some(dir.join("prompts")),
            None => default_prompts_dir(),
        }
    }
}

pub fn parse_strategy(s: &str) -> Result<ModelStrategy> {
    s.parse::<ModelStrategy>().map_err(|e| anyhow!(e))
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
