//! The four-stage expense pipeline
//!
//! Stages are plain structs with an `execute` method, sequenced by
//! [`PipelineCoordinator`]. Each stage logs under a `stage` span.

pub mod analysis;
pub mod coordinator;
pub mod enrichment;
pub mod extraction;
pub mod strategy;

pub use analysis::AnalysisStage;
pub use coordinator::{AnalyzeRequest, PipelineCoordinator, MAX_DAYS};
pub use enrichment::EnrichmentStage;
pub use extraction::ExtractionStage;
pub use strategy::StrategyStage;
