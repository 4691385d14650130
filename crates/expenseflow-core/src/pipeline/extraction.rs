//! Extraction stage: free text -> [`ExpenseRecord`]
//!
//! Each text goes through three tiers, stopping at the first that yields an
//! amount:
//! 1. pattern: `<description> <number>[ ]<currency>` at the end of the text
//! 2. inference: the `parse_expense` prompt on the fast model
//! 3. fallback: the whole text with amount `0.0` (unknown)
//!
//! A failing text never aborts the batch.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::ai::parsing::parse_expense_response;
use crate::ai::InferenceClient;
use crate::categorize::categorize;
use crate::error::Result;
use crate::models::{ExpenseRecord, ExtractionSource};
use crate::prompts::PromptId;

pub const STAGE: &str = "extraction";

/// Trailing amount + currency marker (TL, ₺, TRY, lira), `.` or `,` decimals
const AMOUNT_PATTERN: &str = r"(?i)^(.+?)\s+(\d+(?:[.,]\d+)?)\s*(?:TL|₺|TRY|lira)$";

pub struct ExtractionStage {
    inference: Arc<InferenceClient>,
    pattern: Regex,
}

impl ExtractionStage {
    pub fn new(inference: Arc<InferenceClient>) -> Result<Self> {
        Ok(Self {
            inference,
            pattern: Regex::new(AMOUNT_PATTERN)?,
        })
    }

    /// Pattern tier only: `(description, amount)` when the text ends in an amount
    pub fn parse_pattern(&self, text: &str) -> Option<(String, f64)> {
        let caps = self.pattern.captures(text.trim())?;
        let description = caps.get(1)?.as_str().trim();
        let amount: f64 = caps.get(2)?.as_str().replace(',', ".").parse().ok()?;

        if description.is_empty() || !amount.is_finite() {
            return None;
        }
        Some((description.to_string(), amount))
    }

    /// One record per text, in input order
    pub async fn execute(&self, texts: &[String]) -> Vec<ExpenseRecord> {
        info!(count = texts.len(), "Extracting expenses");

        let mut records = Vec::with_capacity(texts.len());
        for text in texts {
            records.push(self.extract_one(text).await);
        }

        let unknown = records.iter().filter(|r| r.amount_unknown()).count();
        info!(
            records = records.len(),
            unknown_amounts = unknown,
            "Extraction complete"
        );
        records
    }

    async fn extract_one(&self, text: &str) -> ExpenseRecord {
        if let Some((description, amount)) = self.parse_pattern(text) {
            let record = build_record(text, description, amount, ExtractionSource::Pattern);
            debug!(
                record_id = %record.id,
                amount = record.amount,
                category = %record.category,
                "Matched amount pattern"
            );
            return record;
        }

        let mut vars = HashMap::new();
        vars.insert("text", text);

        let parsed = match self.inference.generate_prompt(PromptId::ParseExpense, &vars).await {
            Ok(response) => parse_expense_response(&response, text),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(parsed) => {
                let record = build_record(
                    text,
                    parsed.description,
                    parsed.amount,
                    ExtractionSource::Inference,
                );
                debug!(
                    record_id = %record.id,
                    amount = record.amount,
                    category = %record.category,
                    "Parsed with inference"
                );
                record
            }
            Err(e) => {
                let record =
                    build_record(text, text.trim().to_string(), 0.0, ExtractionSource::Fallback);
                warn!(
                    record_id = %record.id,
                    error = %e,
                    "Could not parse amount, marking as unknown"
                );
                record
            }
        }
    }
}

fn build_record(
    original_text: &str,
    description: String,
    amount: f64,
    source: ExtractionSource,
) -> ExpenseRecord {
    let category = categorize(&description);
    ExpenseRecord::new(original_text, description, amount, category, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIClient, MockBackend};
    use crate::model_router::ModelRouter;
    use crate::models::ExpenseCategory;
    use crate::prompts::PromptLibrary;

    fn stage(mock: MockBackend) -> ExtractionStage {
        let inference = InferenceClient::new(
            Some(AIClient::Mock(mock)),
            Arc::new(ModelRouter::with_config(Default::default())),
            PromptLibrary::embedded_only(),
        )
        .unwrap();
        ExtractionStage::new(Arc::new(inference)).unwrap()
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pattern_variants() {
        let stage = stage(MockBackend::new());
        assert_eq!(stage.parse_pattern("kahve 50 TL"), Some(("kahve".into(), 50.0)));
        assert_eq!(stage.parse_pattern("kahve 50TL"), Some(("kahve".into(), 50.0)));
        assert_eq!(stage.parse_pattern("kahve 45,50 tl"), Some(("kahve".into(), 45.5)));
        assert_eq!(stage.parse_pattern("simit 12.5 ₺"), Some(("simit".into(), 12.5)));
        assert_eq!(stage.parse_pattern("kira 20000 TRY"), Some(("kira".into(), 20000.0)));
        assert_eq!(
            stage.parse_pattern("  market alışverişi 300 lira  "),
            Some(("market alışverişi".into(), 300.0))
        );
    }

    #[test]
    fn test_pattern_rejects() {
        let stage = stage(MockBackend::new());
        assert_eq!(stage.parse_pattern("50 TL"), None);
        assert_eq!(stage.parse_pattern("laptop"), None);
        assert_eq!(stage.parse_pattern("laptop 25000"), None);
        assert_eq!(stage.parse_pattern("50 TL kahve"), None);
        assert_eq!(stage.parse_pattern("kahve 50 TLX"), None);
    }

    #[tokio::test]
    async fn test_pattern_tier_skips_inference() {
        let mock = MockBackend::new();
        let stage = stage(mock.clone());

        let records = stage
            .execute(&texts(&["kahve 50 TL", "market alışverişi 300 TL"]))
            .await;

        assert_eq!(records.len(), 2);
        assert_eq!(mock.call_count(), 0);
        assert!(records.iter().all(|r| r.source == ExtractionSource::Pattern));
        assert!(records.iter().all(|r| r.category == ExpenseCategory::Food));
    }

    #[tokio::test]
    async fn test_inference_tier() {
        let mock = MockBackend::new().with_response(
            "iki bilet",
            r#"{"description": "sinema", "amount": "240"}"#,
        );
        let stage = stage(mock.clone());

        let records = stage.execute(&texts(&["iki bilet iki yüz kırk"])).await;
        assert_eq!(records[0].source, ExtractionSource::Inference);
        assert_eq!(records[0].description, "sinema");
        assert_eq!(records[0].amount, 240.0);
        assert_eq!(records[0].category, ExpenseCategory::Entertainment);
        assert_eq!(records[0].original_text, "iki bilet iki yüz kırk");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fallback_tier_keeps_order() {
        let mock = MockBackend::new().failing("offline");
        let stage = stage(mock);

        let records = stage
            .execute(&texts(&["laptop", "kahve 50 TL", "Netflix"]))
            .await;

        let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![0.0, 50.0, 0.0]);
        assert_eq!(records[0].source, ExtractionSource::Fallback);
        assert_eq!(records[0].description, "laptop");
        assert_eq!(records[0].category, ExpenseCategory::Shopping);
        assert_eq!(records[2].category, ExpenseCategory::Entertainment);
    }

    #[tokio::test]
    async fn test_negative_inference_amount_falls_back() {
        let mock = MockBackend::new()
            .with_default_response(r#"{"description": "refund", "amount": -30}"#);
        let stage = stage(mock);

        let records = stage.execute(&texts(&["refund"])).await;
        assert_eq!(records[0].amount, 0.0);
        assert_eq!(records[0].source, ExtractionSource::Fallback);
    }
}
