//! Pipeline coordinator: extraction -> enrichment -> analysis -> strategy
//!
//! Stages run sequentially. Backend failures are absorbed by the stages, so a
//! run only fails on invalid input, a broken invariant or cancellation.
//! Snapshots go to the store after the run; store errors are logged only.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use crate::ai::InferenceClient;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::models::{AnalysisResult, ExpenseRecord, PipelineReport};
use crate::search::SearchClient;
use crate::store::SnapshotStore;

use super::analysis::{self, AnalysisStage};
use super::enrichment::{self, EnrichmentStage};
use super::extraction::{self, ExtractionStage};
use super::strategy::{self, StrategyStage};

/// Longest window a single run may cover
pub const MAX_DAYS: u32 = 365;

/// Input for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeRequest {
    pub texts: Vec<String>,
    /// Monthly income; absent or zero means the budget status is unknown
    pub income: Option<f64>,
    pub days_analyzed: u32,
    pub enable_enrichment: bool,
}

impl AnalyzeRequest {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            income: None,
            days_analyzed: 1,
            enable_enrichment: true,
        }
    }

    pub fn with_income(mut self, income: f64) -> Self {
        self.income = Some(income);
        self
    }

    pub fn with_days(mut self, days: u32) -> Self {
        self.days_analyzed = days;
        self
    }

    pub fn with_enrichment(mut self, enabled: bool) -> Self {
        self.enable_enrichment = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.texts.is_empty() {
            return Err(Error::InvalidInput("at least one expense text is required".into()));
        }
        if let Some(position) = self.texts.iter().position(|t| t.trim().is_empty()) {
            return Err(Error::InvalidInput(format!(
                "expense text #{} is blank",
                position + 1
            )));
        }
        if !(1..=MAX_DAYS).contains(&self.days_analyzed) {
            return Err(Error::InvalidInput(format!(
                "days analyzed must be between 1 and {}, got {}",
                MAX_DAYS, self.days_analyzed
            )));
        }
        if let Some(income) = self.income {
            if !income.is_finite() || income < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "income must be a non-negative number, got {}",
                    income
                )));
            }
        }
        Ok(())
    }
}

pub struct PipelineCoordinator {
    extraction: ExtractionStage,
    enrichment: EnrichmentStage,
    analysis: AnalysisStage,
    strategy: StrategyStage,
    config: PipelineConfig,
    store: Option<Arc<dyn SnapshotStore>>,
}

impl PipelineCoordinator {
    pub fn new(
        inference: Arc<InferenceClient>,
        search: Option<SearchClient>,
        config: PipelineConfig,
    ) -> Result<Self> {
        Ok(Self {
            extraction: ExtractionStage::new(inference.clone())?,
            enrichment: EnrichmentStage::new(search, config.enrichment.clone()),
            analysis: AnalysisStage::new(),
            strategy: StrategyStage::new(inference),
            config,
            store: None,
        })
    }

    /// Persist snapshots after each run (when storage is enabled)
    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self, request: AnalyzeRequest) -> Result<PipelineReport> {
        self.run_with_cancel(request, &CancellationToken::new()).await
    }

    pub async fn run_with_cancel(
        &self,
        request: AnalyzeRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport> {
        request.validate()?;
        let started = Instant::now();

        info!(
            texts = request.texts.len(),
            days = request.days_analyzed,
            has_income = request.income.is_some(),
            "Pipeline run started"
        );

        check_cancelled(cancel, extraction::STAGE)?;
        let records = self
            .extraction
            .execute(&request.texts)
            .instrument(info_span!("stage", stage = extraction::STAGE))
            .await;

        if records.is_empty() {
            error!(
                stage = extraction::STAGE,
                texts = request.texts.len(),
                "Extraction produced no records"
            );
            return Err(Error::InvariantViolation(format!(
                "extraction produced no records from {} texts",
                request.texts.len()
            )));
        }

        check_cancelled(cancel, enrichment::STAGE)?;
        let records = if self.config.enrichment.enabled && request.enable_enrichment {
            self.enrichment
                .execute(records, cancel)
                .instrument(info_span!("stage", stage = enrichment::STAGE))
                .await
        } else {
            info!(stage = enrichment::STAGE, "Enrichment disabled");
            records
        };

        check_cancelled(cancel, analysis::STAGE)?;
        let analysis = {
            let _span = info_span!("stage", stage = analysis::STAGE).entered();
            self.analysis
                .execute(&records, request.days_analyzed, request.income)?
        };

        check_cancelled(cancel, strategy::STAGE)?;
        let guidance = self
            .strategy
            .execute(&analysis)
            .instrument(info_span!("stage", stage = strategy::STAGE))
            .await;

        self.persist(&records, &analysis).await;

        let processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            analysis_id = %analysis.id,
            records = records.len(),
            status = %analysis.budget_status,
            processing_time_ms,
            "Pipeline run complete"
        );

        Ok(PipelineReport {
            records,
            analysis,
            guidance,
            processing_time_ms,
        })
    }

    /// Store writes are blocking file I/O, so they run off the async workers
    async fn persist(&self, records: &[ExpenseRecord], analysis: &AnalysisResult) {
        if !self.config.storage.enabled {
            return;
        }
        let Some(store) = self.store.clone() else {
            return;
        };
        let records = records.to_vec();
        let analysis = analysis.clone();

        let saved = tokio::task::spawn_blocking(move || {
            if let Err(e) = store.save_records(&records) {
                warn!(store = store.name(), error = %e, "Failed to save records");
            }
            if let Err(e) = store.save_analysis(&analysis) {
                warn!(
                    store = store.name(),
                    analysis_id = %analysis.id,
                    error = %e,
                    "Failed to save analysis"
                );
            }
        })
        .await;

        if let Err(e) = saved {
            warn!(error = %e, "Snapshot task failed");
        }
    }
}

fn check_cancelled(cancel: &CancellationToken, next_stage: &'static str) -> Result<()> {
    if cancel.is_cancelled() {
        warn!(stage = next_stage, "Pipeline run cancelled");
        return Err(Error::Cancelled(next_stage));
    }
    Ok(())
}
