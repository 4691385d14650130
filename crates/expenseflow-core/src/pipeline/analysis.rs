//! Analysis stage: deterministic budget metrics
//!
//! Pure function of (records, days, income). No I/O and no inference.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{AnalysisResult, BudgetStatus, ExpenseCategory, ExpenseRecord};

pub const STAGE: &str = "analysis";

/// Days used to project the daily rate onto a month
pub const DAYS_PER_MONTH: f64 = 30.0;

/// A category at or above this share of total spending is reported as a trend
pub const TREND_SHARE_PERCENT: f64 = 30.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct AnalysisStage;

impl AnalysisStage {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(
        &self,
        records: &[ExpenseRecord],
        days: u32,
        income: Option<f64>,
    ) -> Result<AnalysisResult> {
        if days == 0 {
            return Err(Error::InvalidInput("days analyzed must be at least 1".into()));
        }
        if let Some(income) = income {
            if !income.is_finite() || income < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "income must be a non-negative number, got {}",
                    income
                )));
            }
        }

        let total: f64 = records.iter().map(|r| r.amount).sum();
        let daily_rate = total / f64::from(days);
        // Multiply before dividing so an exact month of spend lands on income
        let monthly_projection = total * DAYS_PER_MONTH / f64::from(days);

        let mut breakdown: BTreeMap<ExpenseCategory, f64> = BTreeMap::new();
        for record in records {
            *breakdown.entry(record.category).or_insert(0.0) += record.amount;
        }

        let (budget_status, usage_percentage, remaining_budget) = match income {
            Some(income) if income > 0.0 => {
                let usage = monthly_projection / income * 100.0;
                (
                    BudgetStatus::from_usage(usage),
                    Some(usage),
                    Some((income - monthly_projection).max(0.0)),
                )
            }
            _ => (BudgetStatus::Unknown, None, None),
        };

        let trends = trends(&breakdown, total);

        info!(
            total,
            daily_rate,
            status = %budget_status,
            "Analysis complete"
        );

        Ok(AnalysisResult {
            id: Uuid::new_v4(),
            total,
            daily_rate,
            monthly_projection,
            days_analyzed: days,
            income,
            category_breakdown: breakdown,
            budget_status,
            usage_percentage,
            remaining_budget,
            trends,
            created_at: Utc::now(),
        })
    }
}

/// High-share categories, largest share first
fn trends(breakdown: &BTreeMap<ExpenseCategory, f64>, total: f64) -> Vec<String> {
    if total <= 0.0 {
        return Vec::new();
    }

    let mut high: Vec<(ExpenseCategory, f64, f64)> = breakdown
        .iter()
        .map(|(category, amount)| (*category, *amount, amount / total * 100.0))
        .filter(|(_, _, share)| *share >= TREND_SHARE_PERCENT)
        .collect();

    // Stable sort keeps declaration order between equal shares
    high.sort_by(|a, b| b.2.total_cmp(&a.2));

    high.into_iter()
        .map(|(category, amount, share)| {
            format!(
                "{} spending is high ({:.0} TL, {:.1}%)",
                category, amount, share
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractionSource;

    fn record(category: ExpenseCategory, amount: f64) -> ExpenseRecord {
        ExpenseRecord::new("x", "x", amount, category, ExtractionSource::Pattern)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_scenario_healthy() {
        let records = vec![
            record(ExpenseCategory::Food, 50.0),
            record(ExpenseCategory::Food, 300.0),
            record(ExpenseCategory::Shopping, 0.0),
        ];
        let result = AnalysisStage::new().execute(&records, 7, Some(15000.0)).unwrap();

        assert!(approx(result.total, 350.0));
        assert!(approx(result.daily_rate, 50.0));
        assert!(approx(result.monthly_projection, 1500.0));
        assert_eq!(result.budget_status, BudgetStatus::Healthy);
        assert!(approx(result.usage_percentage.unwrap(), 10.0));
        assert!(approx(result.remaining_budget.unwrap(), 13500.0));
        assert_eq!(result.trends, vec!["FOOD spending is high (350 TL, 100.0%)"]);
    }

    #[test]
    fn test_scenario_over_budget() {
        let records = vec![
            record(ExpenseCategory::Shopping, 8000.0),
            record(ExpenseCategory::Food, 470.0),
        ];
        let result = AnalysisStage::new().execute(&records, 7, Some(15000.0)).unwrap();

        assert!(approx(result.daily_rate, 1210.0));
        assert!(approx(result.monthly_projection, 36300.0));
        assert!(approx(result.usage_percentage.unwrap(), 242.0));
        assert_eq!(result.budget_status, BudgetStatus::OverBudget);
        assert_eq!(result.remaining_budget, Some(0.0));
    }

    #[test]
    fn test_projection_equal_to_income_is_warning() {
        // 25 / 3 * 30 rounds to 250.00000000000003
        for (total, days, income) in [(25.0, 3, 250.0), (10.0, 3, 100.0), (7.0, 6, 35.0)] {
            let records = vec![record(ExpenseCategory::Food, total)];
            let result = AnalysisStage::new().execute(&records, days, Some(income)).unwrap();
            assert_eq!(result.monthly_projection, income, "{total} over {days} days");
            assert_eq!(result.usage_percentage, Some(100.0));
            assert_eq!(result.budget_status, BudgetStatus::Warning);
            assert_eq!(result.remaining_budget, Some(0.0));
        }
    }

    #[test]
    fn test_breakdown_sums_to_total_and_omits_absent() {
        let records = vec![
            record(ExpenseCategory::Food, 10.5),
            record(ExpenseCategory::Transport, 20.25),
            record(ExpenseCategory::Food, 4.5),
        ];
        let result = AnalysisStage::new().execute(&records, 1, None).unwrap();

        let sum: f64 = result.category_breakdown.values().sum();
        assert!(approx(sum, result.total));
        assert_eq!(result.category_breakdown.len(), 2);
        assert!(!result.category_breakdown.contains_key(&ExpenseCategory::Health));
    }

    #[test]
    fn test_no_income_is_unknown() {
        let records = vec![record(ExpenseCategory::Food, 100.0)];
        for income in [None, Some(0.0)] {
            let result = AnalysisStage::new().execute(&records, 3, income).unwrap();
            assert_eq!(result.budget_status, BudgetStatus::Unknown);
            assert!(result.usage_percentage.is_none());
            assert!(result.remaining_budget.is_none());
        }
    }

    #[test]
    fn test_status_severity_monotonic_in_income() {
        let records = vec![record(ExpenseCategory::Food, 1000.0)];
        let mut last = 0;
        for income in [100_000.0, 40_000.0, 36_000.0, 30_000.0, 29_000.0, 1_000.0] {
            let result = AnalysisStage::new().execute(&records, 1, Some(income)).unwrap();
            let severity = result.budget_status.severity().unwrap();
            assert!(severity >= last, "income {income}");
            last = severity;
        }
        assert_eq!(last, 2);
    }

    #[test]
    fn test_trends_ordering_and_threshold() {
        let records = vec![
            record(ExpenseCategory::Food, 300.0),
            record(ExpenseCategory::Transport, 500.0),
            record(ExpenseCategory::Health, 200.0),
        ];
        let result = AnalysisStage::new().execute(&records, 1, None).unwrap();
        assert_eq!(
            result.trends,
            vec![
                "TRANSPORT spending is high (500 TL, 50.0%)",
                "FOOD spending is high (300 TL, 30.0%)",
            ]
        );
    }

    #[test]
    fn test_zero_total_has_no_trends() {
        let records = vec![record(ExpenseCategory::Shopping, 0.0)];
        let result = AnalysisStage::new().execute(&records, 1, Some(1000.0)).unwrap();
        assert!(result.trends.is_empty());
        assert_eq!(result.budget_status, BudgetStatus::Healthy);
    }

    #[test]
    fn test_invalid_inputs() {
        let stage = AnalysisStage::new();
        assert!(matches!(stage.execute(&[], 0, None), Err(Error::InvalidInput(_))));
        assert!(matches!(
            stage.execute(&[], 1, Some(-1.0)),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            stage.execute(&[], 1, Some(f64::NAN)),
            Err(Error::InvalidInput(_))
        ));
    }
}
