//! Model Router for task-based backend selection
//!
//! Routes each inference task to one of two backends:
//! - `Fast`: small model, used where responsiveness matters (parsing, queries)
//! - `Accurate`: larger model, used for open-ended reasoning (recommendations)
//!
//! The choice is made by [`select`], a pure function of the task category and
//! the configured [`ModelStrategy`]. The router then maps the chosen backend to
//! a concrete model name, timeout and temperature.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/expenseflow/config/models.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Environment variables (`MODEL_STRATEGY`, `OLLAMA_FAST_MODEL`,
//! `OLLAMA_ACCURATE_MODEL`) are applied on top of either layer.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/models.toml");

/// Label used to route an inference call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskCategory {
    /// Parse free text into (description, amount)
    Extract,
    /// Build a web search query
    SearchQuery,
    /// Numeric / aggregate analysis
    Analyze,
    /// Natural-language budget guidance
    Recommend,
    /// Anything not listed above
    General,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::SearchQuery => "search-query",
            Self::Analyze => "analyze",
            Self::Recommend => "recommend",
            Self::General => "general",
        }
    }

    /// Parse a task label. Unrecognized labels map to `General`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "extract" | "classify" => Self::Extract,
            "search-query" | "search" => Self::SearchQuery,
            "analyze" => Self::Analyze,
            "recommend" => Self::Recommend,
            _ => Self::General,
        }
    }

    pub fn all() -> &'static [TaskCategory] {
        &[
            Self::Extract,
            Self::SearchQuery,
            Self::Analyze,
            Self::Recommend,
            Self::General,
        ]
    }
}

impl std::fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which inference backend serves a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendId {
    Fast,
    Accurate,
}

impl BackendId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Accurate => "accurate",
        }
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Backend selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelStrategy {
    /// Route per task category
    #[default]
    Auto,
    /// Always the fast backend
    ForcedFast,
    /// Always the accurate backend
    ForcedAccurate,
}

impl ModelStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::ForcedFast => "fast",
            Self::ForcedAccurate => "accurate",
        }
    }
}

impl std::str::FromStr for ModelStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "fast" | "forced-fast" | "forced_fast" => Ok(Self::ForcedFast),
            "accurate" | "forced-accurate" | "forced_accurate" => Ok(Self::ForcedAccurate),
            _ => Err(format!("Unknown model strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for ModelStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Auto-strategy routing table. Categories not listed route to `Fast`.
static AUTO_ROUTES: &[(TaskCategory, BackendId)] = &[
    (TaskCategory::Extract, BackendId::Fast),
    (TaskCategory::SearchQuery, BackendId::Fast),
    (TaskCategory::Analyze, BackendId::Fast),
    (TaskCategory::Recommend, BackendId::Accurate),
];

/// Pick the backend for a task under a strategy
pub fn select(task: TaskCategory, strategy: ModelStrategy) -> BackendId {
    match strategy {
        ModelStrategy::ForcedFast => BackendId::Fast,
        ModelStrategy::ForcedAccurate => BackendId::Accurate,
        ModelStrategy::Auto => AUTO_ROUTES
            .iter()
            .find(|(t, _)| *t == task)
            .map(|(_, backend)| *backend)
            .unwrap_or(BackendId::Fast),
    }
}

/// Configuration for one backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Model name passed to the inference server
    pub model: String,
    /// Timeout for a single call
    pub timeout: Duration,
    /// Sampling temperature (prompts may override)
    pub temperature: Option<f32>,
}

/// Router configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub strategy: ModelStrategy,
    pub default_timeout: Duration,
    pub fast: BackendConfig,
    pub accurate: BackendConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            strategy: ModelStrategy::Auto,
            default_timeout: Duration::from_secs(60),
            fast: BackendConfig {
                model: "llama3.2:3b".to_string(),
                timeout: Duration::from_secs(30),
                temperature: Some(0.3),
            },
            accurate: BackendConfig {
                model: "llama3.1:8b".to_string(),
                timeout: Duration::from_secs(90),
                temperature: Some(0.8),
            },
        }
    }
}

impl RouterConfig {
    /// Apply `MODEL_STRATEGY`, `OLLAMA_FAST_MODEL`, `OLLAMA_ACCURATE_MODEL`
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(strategy) = get("MODEL_STRATEGY") {
            self.strategy = strategy.parse().map_err(Error::Config)?;
        }
        if let Some(model) = get("OLLAMA_FAST_MODEL") {
            self.fast.model = model;
        }
        if let Some(model) = get("OLLAMA_ACCURATE_MODEL") {
            self.accurate.model = model;
        }
        Ok(())
    }
}

/// Model Router for task-based backend selection
#[derive(Debug, Clone)]
pub struct ModelRouter {
    config: RouterConfig,
    config_path: Option<PathBuf>,
}

impl ModelRouter {
    /// Create a new model router from the default config locations plus env
    pub fn new() -> Result<Self> {
        let mut config = load_config(None)?;
        config.apply_env()?;
        Ok(Self {
            config,
            config_path: default_config_path(),
        })
    }

    /// Create with a custom config path
    pub fn with_config_path(path: PathBuf) -> Result<Self> {
        let mut config = load_config(Some(&path))?;
        config.apply_env()?;
        Ok(Self {
            config,
            config_path: Some(path),
        })
    }

    /// Create with an explicit configuration (for testing)
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            config,
            config_path: None,
        }
    }

    /// Replace the strategy (e.g. from a CLI flag)
    pub fn with_strategy(mut self, strategy: ModelStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> ModelStrategy {
        self.config.strategy
    }

    /// Backend chosen for a task under the configured strategy
    pub fn backend_for_task(&self, task: TaskCategory) -> BackendId {
        select(task, self.config.strategy)
    }

    pub fn backend_config(&self, backend: BackendId) -> &BackendConfig {
        match backend {
            BackendId::Fast => &self.config.fast,
            BackendId::Accurate => &self.config.accurate,
        }
    }

    /// Get the model to use for a task
    pub fn model_for_task(&self, task: TaskCategory) -> &str {
        &self.backend_config(self.backend_for_task(task)).model
    }

    /// Get the timeout for a task
    pub fn timeout_for_task(&self, task: TaskCategory) -> Duration {
        self.backend_config(self.backend_for_task(task)).timeout
    }

    /// Get the backend default temperature for a task
    pub fn temperature_for_task(&self, task: TaskCategory) -> Option<f32> {
        self.backend_config(self.backend_for_task(task)).temperature
    }

    /// Routing table for display: (task, backend, model)
    pub fn routes(&self) -> Vec<(TaskCategory, BackendId, String)> {
        TaskCategory::all()
            .iter()
            .map(|&task| {
                let backend = self.backend_for_task(task);
                (task, backend, self.backend_config(backend).model.clone())
            })
            .collect()
    }

    /// Get the router configuration
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Get the config path (if using file-based config)
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::with_config(RouterConfig::default()))
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("expenseflow").join("config").join("models.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&PathBuf>) -> Result<RouterConfig> {
    let path = override_path.cloned().or_else(default_config_path);

    let content = match path {
        Some(ref p) if p.exists() => fs::read_to_string(p)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", p.display(), e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawDefaults>,
    backends: Option<HashMap<String, RawBackend>>,
}

#[derive(Debug, Deserialize)]
struct RawDefaults {
    strategy: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawBackend {
    model: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<RouterConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid models TOML: {}", e)))?;

    let mut config = RouterConfig::default();

    if let Some(defaults) = raw.defaults {
        if let Some(strategy) = defaults.strategy {
            config.strategy = strategy.parse().map_err(Error::Config)?;
        }
        if let Some(timeout) = defaults.timeout_secs {
            config.default_timeout = Duration::from_secs(timeout);
        }
    }

    if let Some(backends) = raw.backends {
        for (name, raw_backend) in backends {
            let target = match name.as_str() {
                "fast" => &mut config.fast,
                "accurate" => &mut config.accurate,
                _ => continue, // Skip unknown backends
            };

            if let Some(model) = raw_backend.model {
                target.model = model;
            }
            target.timeout = raw_backend
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(config.default_timeout);
            if raw_backend.temperature.is_some() {
                target.temperature = raw_backend.temperature;
            }
        }
    }

    Ok(config)
}
