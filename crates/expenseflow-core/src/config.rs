//! Pipeline configuration
//!
//! Same two-layer resolution as the model router: an override file at
//! `~/.local/share/expenseflow/config/pipeline.toml` (or an explicit path),
//! falling back to the embedded default. Environment variables
//! `EXPENSEFLOW_SEARCH_THRESHOLD` and `EXPENSEFLOW_ENABLE_SEARCH` win over both.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/pipeline.toml");

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    /// Records with `amount >= threshold` (or unknown amount) are searched
    pub threshold: f64,
    /// Search hits kept per record
    pub max_results: usize,
    /// Searches in flight at once
    pub concurrency: usize,
    /// Per-search timeout
    pub timeout: Duration,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 100.0,
            max_results: 3,
            concurrency: 4,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    /// Save snapshots after each run
    pub enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Configuration handed to the pipeline coordinator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub enrichment: EnrichmentConfig,
    pub storage: StorageConfig,
}

impl PipelineConfig {
    /// Load from the default locations, then apply the environment
    pub fn load() -> Result<Self> {
        let mut config = load_config(None)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Load from an explicit override file (missing file = embedded default)
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = load_config(Some(path))?;
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = get("EXPENSEFLOW_SEARCH_THRESHOLD") {
            self.enrichment.threshold = parse_threshold(&value)?;
        }
        if let Some(value) = get("EXPENSEFLOW_ENABLE_SEARCH") {
            self.enrichment.enabled = parse_bool(&value).ok_or_else(|| {
                Error::Config(format!("EXPENSEFLOW_ENABLE_SEARCH: not a boolean: {}", value))
            })?;
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("expenseflow").join("config").join("pipeline.toml"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_threshold(value: &str) -> Result<f64> {
    let threshold: f64 = value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid search threshold: {}", value)))?;
    validate_threshold(threshold)
}

fn validate_threshold(threshold: f64) -> Result<f64> {
    if threshold.is_finite() && threshold >= 0.0 {
        Ok(threshold)
    } else {
        Err(Error::Config(format!(
            "Search threshold must be a non-negative number, got {}",
            threshold
        )))
    }
}

fn load_config(override_path: Option<&Path>) -> Result<PipelineConfig> {
    let path = override_path.map(Path::to_path_buf).or_else(default_config_path);

    let content = match path {
        Some(ref p) if p.exists() => fs::read_to_string(p)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", p.display(), e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    enrichment: Option<RawEnrichment>,
    storage: Option<RawStorage>,
}

#[derive(Debug, Deserialize)]
struct RawEnrichment {
    enabled: Option<bool>,
    threshold: Option<f64>,
    max_results: Option<usize>,
    concurrency: Option<usize>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawStorage {
    enabled: Option<bool>,
}

fn parse_config(content: &str) -> Result<PipelineConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid pipeline TOML: {}", e)))?;

    let mut config = PipelineConfig::default();

    if let Some(enrichment) = raw.enrichment {
        let target = &mut config.enrichment;
        if let Some(enabled) = enrichment.enabled {
            target.enabled = enabled;
        }
        if let Some(threshold) = enrichment.threshold {
            target.threshold = validate_threshold(threshold)?;
        }
        if let Some(max_results) = enrichment.max_results {
            target.max_results = max_results;
        }
        if let Some(concurrency) = enrichment.concurrency {
            // buffer_unordered(0) would never make progress
            target.concurrency = concurrency.max(1);
        }
        if let Some(timeout) = enrichment.timeout_secs {
            target.timeout = Duration::from_secs(timeout);
        }
    }

    if let Some(storage) = raw.storage {
        if let Some(enabled) = storage.enabled {
            config.storage.enabled = enabled;
        }
    }

    Ok(config)
}
