//! Strategy stage: guidance text, prioritized actions and goals
//!
//! The summary and recommendations come from the accurate model when it
//! answers with something parsable, otherwise from per-status templates.
//! Actions and goals are always rule-derived from the analysis, so a report
//! carries the same actions whether or not inference worked.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::parsing::parse_guidance_text;
use crate::ai::InferenceClient;
use crate::models::{
    ActionItem, ActionPriority, AnalysisResult, BudgetStatus, Goal, Guidance, GuidanceSource,
};
use crate::prompts::PromptId;

pub const STAGE: &str = "strategy";

/// Goals aim for this fraction of the current value
pub const GOAL_REDUCTION_FACTOR: f64 = 0.8;
/// Savings estimate for the WARNING action (share of the top category)
pub const WARNING_SAVINGS_RATE: f64 = 0.15;
/// Cut suggested (and savings estimated) when over budget
pub const OVER_BUDGET_CUT_RATE: f64 = 0.30;

pub struct StrategyStage {
    inference: Arc<InferenceClient>,
}

impl StrategyStage {
    pub fn new(inference: Arc<InferenceClient>) -> Self {
        Self { inference }
    }

    pub async fn execute(&self, analysis: &AnalysisResult) -> Guidance {
        let status = analysis.budget_status;

        let vars = prompt_vars(analysis);
        let borrowed: HashMap<&str, &str> =
            vars.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let parsed = match self
            .inference
            .generate_prompt(PromptId::RecommendStrategy, &borrowed)
            .await
        {
            Ok(text) => {
                let parsed = parse_guidance_text(&text);
                if parsed.is_none() {
                    warn!(
                        analysis_id = %analysis.id,
                        "Guidance response had no summary, using template"
                    );
                }
                parsed
            }
            Err(e) => {
                warn!(
                    analysis_id = %analysis.id,
                    error = %e,
                    "Guidance generation failed, using template"
                );
                None
            }
        };

        let (summary, recommendations, source) = match parsed {
            Some(parsed) => {
                let recommendations = if parsed.recommendations.is_empty() {
                    default_recommendations(status)
                } else {
                    parsed.recommendations
                };
                (parsed.summary, recommendations, GuidanceSource::Inference)
            }
            None => (
                template_summary(status).to_string(),
                default_recommendations(status),
                GuidanceSource::Template,
            ),
        };

        let guidance = Guidance {
            id: Uuid::new_v4(),
            analysis_id: analysis.id,
            summary,
            recommendations,
            action_items: action_items(analysis),
            goals: goals(analysis),
            source,
            created_at: Utc::now(),
        };

        info!(
            source = ?guidance.source,
            actions = guidance.action_items.len(),
            goals = guidance.goals.len(),
            "Guidance ready"
        );
        guidance
    }
}

/// Owned template variables for the `recommend_strategy` prompt
fn prompt_vars(analysis: &AnalysisResult) -> Vec<(&'static str, String)> {
    let mut categories: Vec<_> = analysis.category_breakdown.iter().collect();
    categories.sort_by(|a, b| b.1.total_cmp(a.1));
    let categories = if categories.is_empty() {
        "  (no data)".to_string()
    } else {
        categories
            .iter()
            .map(|(category, amount)| {
                format!(
                    "  - {}: {:.0} TL ({:.1}%)",
                    category,
                    amount,
                    analysis.share_of(**category)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let trends = if analysis.trends.is_empty() {
        "  (none)".to_string()
    } else {
        analysis
            .trends
            .iter()
            .map(|t| format!("  - {}", t))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let has_income = analysis.usage_percentage.is_some();
    let opt = |value: Option<f64>, precision: usize| {
        value
            .filter(|_| has_income)
            .map(|v| format!("{:.*}", precision, v))
            .unwrap_or_default()
    };

    vec![
        ("total", format!("{:.2}", analysis.total)),
        ("daily", format!("{:.2}", analysis.daily_rate)),
        ("monthly", format!("{:.2}", analysis.monthly_projection)),
        ("days", analysis.days_analyzed.to_string()),
        ("status", analysis.budget_status.to_string()),
        ("income", opt(analysis.income, 0)),
        ("remaining", opt(analysis.remaining_budget, 0)),
        ("usage", opt(analysis.usage_percentage, 1)),
        ("categories", categories),
        ("trends", trends),
    ]
}

/// Summary used when inference is unavailable or unparsable
pub fn template_summary(status: BudgetStatus) -> &'static str {
    match status {
        BudgetStatus::Healthy => {
            "Your spending is well within your income. Keep up the current habits."
        }
        BudgetStatus::Warning => {
            "Your projected spending is close to your income. A few adjustments now will keep you on budget."
        }
        BudgetStatus::OverBudget => {
            "Your projected spending exceeds your income. Immediate cuts are needed to get back on track."
        }
        BudgetStatus::Unknown => {
            "Your spending has been analyzed. Add your monthly income to see how it compares to your budget."
        }
    }
}

pub fn default_recommendations(status: BudgetStatus) -> Vec<String> {
    let items: &[&str] = match status {
        BudgetStatus::Healthy => &[
            "Keep recording every expense to maintain visibility",
            "Move part of the remaining budget into savings",
        ],
        BudgetStatus::Warning => &[
            "Review your largest spending category for easy cuts",
            "Set a weekly spending limit for discretionary purchases",
            "Postpone non-urgent purchases until next month",
        ],
        BudgetStatus::OverBudget => &[
            "Stop all non-essential purchases immediately",
            "Cancel or pause subscriptions you do not use",
            "Plan meals at home instead of eating out",
            "Set a strict daily spending limit until the budget recovers",
        ],
        BudgetStatus::Unknown => &[
            "Enter your monthly income to get a budget status",
            "Keep recording expenses to see spending trends",
        ],
    };
    items.iter().map(|s| s.to_string()).collect()
}

/// Rule-derived actions for a status
pub fn action_items(analysis: &AnalysisResult) -> Vec<ActionItem> {
    match analysis.budget_status {
        BudgetStatus::Healthy => vec![ActionItem::new(
            "Continue tracking your expenses to stay on budget",
            ActionPriority::Low,
        )],
        BudgetStatus::Warning => match analysis.top_category() {
            Some((category, subtotal)) => vec![ActionItem::new(
                format!(
                    "Reduce {} spending ({:.0} TL), your highest-spending category",
                    category, subtotal
                ),
                ActionPriority::Medium,
            )
            .with_savings(subtotal * WARNING_SAVINGS_RATE)],
            None => vec![ActionItem::new(
                "Review your spending to stay under your income",
                ActionPriority::Medium,
            )],
        },
        BudgetStatus::OverBudget => vec![
            ActionItem::new(
                format!(
                    "Cut total spending by {:.0}% to get back under your income",
                    OVER_BUDGET_CUT_RATE * 100.0
                ),
                ActionPriority::Urgent,
            )
            .with_savings(analysis.monthly_projection * OVER_BUDGET_CUT_RATE),
            ActionItem::new("Stop all non-essential spending", ActionPriority::High),
        ],
        BudgetStatus::Unknown => vec![ActionItem::new(
            "Add your monthly income to get budget recommendations",
            ActionPriority::Low,
        )],
    }
}

/// Daily goal, plus a category goal when a trend was detected
pub fn goals(analysis: &AnalysisResult) -> Vec<Goal> {
    let daily_target = analysis.daily_rate * GOAL_REDUCTION_FACTOR;
    let mut goals = vec![Goal {
        description: format!("Reduce daily spending to {:.0} TL", daily_target),
        current_value: analysis.daily_rate,
        target_value: daily_target,
        timeframe: "7 days".to_string(),
        category: None,
    }];

    if !analysis.trends.is_empty() {
        if let Some((category, subtotal)) = analysis.top_category() {
            let target = subtotal * GOAL_REDUCTION_FACTOR;
            goals.push(Goal {
                description: format!("Reduce {} spending to {:.0} TL", category, target),
                current_value: subtotal,
                target_value: target,
                timeframe: "30 days".to_string(),
                category: Some(category),
            });
        }
    }

    goals
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::ai::{AIClient, MockBackend};
    use crate::model_router::ModelRouter;
    use crate::models::ExpenseCategory;
    use crate::prompts::PromptLibrary;

    fn analysis(status: BudgetStatus, breakdown: &[(ExpenseCategory, f64)]) -> AnalysisResult {
        let total: f64 = breakdown.iter().map(|(_, a)| a).sum();
        let trends = breakdown
            .iter()
            .filter(|(_, a)| total > 0.0 && a / total >= 0.3)
            .map(|(c, _)| format!("{} spending is high", c))
            .collect();
        AnalysisResult {
            id: Uuid::new_v4(),
            total,
            daily_rate: total / 7.0,
            monthly_projection: total / 7.0 * 30.0,
            days_analyzed: 7,
            income: Some(15000.0),
            category_breakdown: breakdown.iter().copied().collect::<BTreeMap<_, _>>(),
            budget_status: status,
            usage_percentage: Some(50.0),
            remaining_budget: Some(1000.0),
            trends,
            created_at: Utc::now(),
        }
    }

    fn stage(mock: MockBackend) -> StrategyStage {
        let inference = InferenceClient::new(
            Some(AIClient::Mock(mock)),
            Arc::new(ModelRouter::with_config(Default::default())),
            PromptLibrary::embedded_only(),
        )
        .unwrap();
        StrategyStage::new(Arc::new(inference))
    }

    #[test]
    fn test_actions_per_status() {
        let breakdown = [(ExpenseCategory::Food, 300.0), (ExpenseCategory::Shopping, 700.0)];

        let healthy = action_items(&analysis(BudgetStatus::Healthy, &breakdown));
        assert_eq!(healthy.len(), 1);
        assert_eq!(healthy[0].priority, ActionPriority::Low);

        let warning = action_items(&analysis(BudgetStatus::Warning, &breakdown));
        assert_eq!(warning.len(), 1);
        assert_eq!(warning[0].priority, ActionPriority::Medium);
        assert!(warning[0].description.contains("SHOPPING"));
        assert!((warning[0].potential_savings.unwrap() - 105.0).abs() < 1e-9);

        let over = analysis(BudgetStatus::OverBudget, &breakdown);
        let items = action_items(&over);
        let priorities: Vec<_> = items.iter().map(|a| a.priority).collect();
        assert_eq!(priorities, vec![ActionPriority::Urgent, ActionPriority::High]);
        let expected = over.monthly_projection * 0.3;
        assert!((items[0].potential_savings.unwrap() - expected).abs() < 1e-9);

        let unknown = action_items(&analysis(BudgetStatus::Unknown, &breakdown));
        assert_eq!(unknown.len(), 1);
        assert!(unknown[0].description.contains("income"));
    }

    #[test]
    fn test_goals() {
        let with_trend = analysis(
            BudgetStatus::Healthy,
            &[(ExpenseCategory::Food, 350.0)],
        );
        let goals = goals(&with_trend);
        assert_eq!(goals.len(), 2);
        assert!((goals[0].target_value - with_trend.daily_rate * 0.8).abs() < 1e-9);
        assert_eq!(goals[0].timeframe, "7 days");
        assert_eq!(goals[1].category, Some(ExpenseCategory::Food));
        assert!((goals[1].target_value - 280.0).abs() < 1e-9);
        assert_eq!(goals[1].timeframe, "30 days");

        let mut no_trend = with_trend.clone();
        no_trend.trends.clear();
        assert_eq!(super::goals(&no_trend).len(), 1);
    }

    #[tokio::test]
    async fn test_inference_guidance_is_parsed() {
        let mock = MockBackend::new().with_default_response(
            "You are doing great and have plenty of room left.\n\n1. Save 20% of income\n2. Keep a coffee budget",
        );
        let guidance = stage(mock)
            .execute(&analysis(BudgetStatus::Healthy, &[(ExpenseCategory::Food, 350.0)]))
            .await;

        assert_eq!(guidance.source, GuidanceSource::Inference);
        assert_eq!(guidance.summary, "You are doing great and have plenty of room left.");
        assert_eq!(guidance.recommendations.len(), 2);
        assert!(!guidance.action_items.is_empty());
        assert!(!guidance.goals.is_empty());
    }

    #[tokio::test]
    async fn test_summary_without_items_uses_default_recommendations() {
        let mock = MockBackend::new()
            .with_default_response("Spending is on track for the analyzed period.");
        let guidance = stage(mock)
            .execute(&analysis(BudgetStatus::Healthy, &[(ExpenseCategory::Food, 350.0)]))
            .await;

        assert_eq!(guidance.source, GuidanceSource::Inference);
        assert_eq!(
            guidance.recommendations,
            default_recommendations(BudgetStatus::Healthy)
        );
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_template() {
        let over = analysis(
            BudgetStatus::OverBudget,
            &[(ExpenseCategory::Shopping, 8000.0), (ExpenseCategory::Food, 470.0)],
        );

        for mock in [
            MockBackend::new().failing("offline"),
            MockBackend::new().with_default_response("1. only\n2. bullets"),
        ] {
            let guidance = stage(mock).execute(&over).await;
            assert_eq!(guidance.source, GuidanceSource::Template);
            assert_eq!(guidance.summary, template_summary(BudgetStatus::OverBudget));
            assert_eq!(guidance.analysis_id, over.id);
            let priorities: Vec<_> = guidance.action_items.iter().map(|a| a.priority).collect();
            assert_eq!(priorities, vec![ActionPriority::Urgent, ActionPriority::High]);
        }
    }

    #[test]
    fn test_prompt_vars_without_income() {
        let mut unknown = analysis(BudgetStatus::Unknown, &[(ExpenseCategory::Food, 70.0)]);
        unknown.income = None;
        unknown.usage_percentage = None;
        unknown.remaining_budget = None;

        let vars: HashMap<_, _> = prompt_vars(&unknown).into_iter().collect();
        assert_eq!(vars["income"], "");
        assert_eq!(vars["status"], "UNKNOWN");
        assert_eq!(vars["categories"], "  - FOOD: 70 TL (100.0%)");
    }
}
