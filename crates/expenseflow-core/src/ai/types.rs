//! Inference request/response types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::{Deserialize, Serialize};

/// A single text-generation request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateRequest {
    /// User prompt
    pub prompt: String,
    /// Optional system prompt
    pub system: Option<String>,
    /// Sampling temperature; backend default when absent
    pub temperature: Option<f32>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Structured expense parsed from an inference response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedExpense {
    pub description: String,
    pub amount: f64,
}

/// Guidance text split into summary + enumerated recommendations
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedGuidance {
    pub summary: String,
    /// Empty when the response had prose but no enumerated lines
    pub recommendations: Vec<String>,
}

/// Backend status for display
#[derive(Debug, Clone)]
pub struct BackendInfo {
    pub name: &'static str,
    pub host: String,
    pub healthy: bool,
}
