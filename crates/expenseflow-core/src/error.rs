//! Error types for ExpenseFlow

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Request shape errors, rejected before the pipeline starts
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("{operation} timed out after {}s", .after.as_secs_f64())]
    Timeout { operation: String, after: Duration },

    /// A pipeline invariant was broken (e.g. zero extracted records)
    #[error("Pipeline invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Pipeline run cancelled before stage {0}")]
    Cancelled(&'static str),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Whether this error came from an external backend (inference or search).
    ///
    /// Stages absorb these and fall back; everything else propagates.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Error::BackendUnavailable(_)
                | Error::Timeout { .. }
                | Error::Http(_)
                | Error::Json(_)
                | Error::InvalidData(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
