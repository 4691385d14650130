//! Enrichment stage: market-price lookups for expensive or unknown items
//!
//! A record is selected when `amount >= threshold` or its amount is unknown.
//! Selected records are searched concurrently (at most `concurrency` at a
//! time). Each search owns only its record index and description; results
//! are written back by index, so output order never depends on completion
//! order. Failed, empty or timed-out searches leave the record untouched.

use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EnrichmentConfig;
use crate::error::Error;
use crate::models::{ExpenseRecord, META_SEARCHED, META_SEARCH_RESULTS};
use crate::search::{SearchBackend, SearchClient, SearchHit};

pub const STAGE: &str = "enrichment";

pub struct EnrichmentStage {
    search: Option<SearchClient>,
    config: EnrichmentConfig,
}

struct SearchJob {
    index: usize,
    record_id: Uuid,
    description: String,
}

impl EnrichmentStage {
    pub fn new(search: Option<SearchClient>, config: EnrichmentConfig) -> Self {
        Self { search, config }
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    /// Whether a record warrants a price lookup
    pub fn is_selected(&self, record: &ExpenseRecord) -> bool {
        record.amount >= self.config.threshold || record.amount_unknown()
    }

    /// Search selected records and merge hits into their metadata
    pub async fn execute(
        &self,
        mut records: Vec<ExpenseRecord>,
        cancel: &CancellationToken,
    ) -> Vec<ExpenseRecord> {
        let Some(search) = self.search.as_ref() else {
            info!("No search backend configured, skipping");
            return records;
        };

        let jobs: Vec<SearchJob> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| self.is_selected(record))
            .map(|(index, record)| SearchJob {
                index,
                record_id: record.id,
                description: record.description.clone(),
            })
            .collect();

        if jobs.is_empty() {
            info!("No records above threshold");
            return records;
        }

        info!(
            selected = jobs.len(),
            threshold = self.config.threshold,
            backend = search.name(),
            "Searching market prices"
        );

        let outcomes: Vec<(usize, Vec<SearchHit>)> = stream::iter(jobs)
            .map(|job| self.search_one(search, job, cancel))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut enriched = 0;
        for (index, hits) in outcomes {
            if hits.is_empty() {
                continue;
            }
            if let Some(record) = records.get_mut(index) {
                record
                    .metadata
                    .insert(META_SEARCHED.to_string(), Value::Bool(true));
                record
                    .metadata
                    .insert(META_SEARCH_RESULTS.to_string(), hits_to_json(&hits));
                enriched += 1;
            }
        }

        info!(enriched, "Enrichment complete");
        records
    }

    /// Run one search; any failure becomes an empty result
    async fn search_one(
        &self,
        search: &SearchClient,
        job: SearchJob,
        cancel: &CancellationToken,
    ) -> (usize, Vec<SearchHit>) {
        if cancel.is_cancelled() {
            debug!(record_id = %job.record_id, "Cancelled before search");
            return (job.index, Vec::new());
        }

        let result = tokio::time::timeout(
            self.config.timeout,
            search.search_product_price(&job.description),
        )
        .await
        .unwrap_or_else(|_| {
            Err(Error::Timeout {
                operation: "price search".to_string(),
                after: self.config.timeout,
            })
        });

        match result {
            Ok(mut hits) => {
                debug!(
                    record_id = %job.record_id,
                    hits = hits.len(),
                    "Search finished"
                );
                hits.truncate(self.config.max_results);
                (job.index, hits)
            }
            Err(e) => {
                warn!(
                    record_id = %job.record_id,
                    error = %e,
                    "Price search failed"
                );
                (job.index, Vec::new())
            }
        }
    }
}

fn hits_to_json(hits: &[SearchHit]) -> Value {
    Value::Array(
        hits.iter()
            .map(|hit| {
                json!({
                    "title": hit.title,
                    "link": hit.link,
                    "snippet": hit.snippet,
                })
            })
            .collect(),
    )
}
