//! Domain models for ExpenseFlow

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata key set when a market-price search returned results
pub const META_SEARCHED: &str = "searched";
/// Metadata key holding the (capped) search results
pub const META_SEARCH_RESULTS: &str = "search_results";

/// Expense categories (closed set)
///
/// Declaration order matters: it is the keyword tie-break order used by
/// [`crate::categorize::categorize`] and the ordering of breakdown maps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseCategory {
    Food,
    Transport,
    Utilities,
    Entertainment,
    Health,
    Education,
    Shopping,
    Housing,
    Personal,
    #[default]
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "FOOD",
            Self::Transport => "TRANSPORT",
            Self::Utilities => "UTILITIES",
            Self::Entertainment => "ENTERTAINMENT",
            Self::Health => "HEALTH",
            Self::Education => "EDUCATION",
            Self::Shopping => "SHOPPING",
            Self::Housing => "HOUSING",
            Self::Personal => "PERSONAL",
            Self::Other => "OTHER",
        }
    }

    /// All categories in declaration order
    pub fn all() -> &'static [ExpenseCategory] {
        &[
            Self::Food,
            Self::Transport,
            Self::Utilities,
            Self::Entertainment,
            Self::Health,
            Self::Education,
            Self::Shopping,
            Self::Housing,
            Self::Personal,
            Self::Other,
        ]
    }
}

impl std::str::FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which extraction tier produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    /// Amount + currency marker matched at the end of the text
    Pattern,
    /// Parsed from an inference backend response
    Inference,
    /// Nothing parsed; amount is the 0.0 sentinel
    Fallback,
}

impl ExtractionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Inference => "inference",
            Self::Fallback => "fallback",
        }
    }
}

/// A single expense parsed from free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: Uuid,
    /// Raw user input
    pub original_text: String,
    pub description: String,
    /// Always >= 0. `0.0` means the amount could not be determined.
    pub amount: f64,
    pub category: ExpenseCategory,
    pub source: ExtractionSource,
    /// Enrichment results (search hits etc.)
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl ExpenseRecord {
    pub fn new(
        original_text: impl Into<String>,
        description: impl Into<String>,
        amount: f64,
        category: ExpenseCategory,
        source: ExtractionSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_text: original_text.into(),
            description: description.into(),
            amount,
            category,
            source,
            metadata: serde_json::Map::new(),
            created_at: Utc::now(),
        }
    }

    /// True when the amount is the "unknown" sentinel
    pub fn amount_unknown(&self) -> bool {
        self.amount == 0.0
    }

    /// True when enrichment attached search results
    pub fn is_searched(&self) -> bool {
        self.metadata
            .get(META_SEARCHED)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Budget health derived from projected spend vs income
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetStatus {
    /// Usage below 80%
    Healthy,
    /// Usage 80-100%
    Warning,
    /// Usage above 100%
    OverBudget,
    /// No income given
    Unknown,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::Warning => "WARNING",
            Self::OverBudget => "OVER_BUDGET",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Classify a usage percentage
    pub fn from_usage(usage_percentage: f64) -> Self {
        if usage_percentage < 80.0 {
            Self::Healthy
        } else if usage_percentage <= 100.0 {
            Self::Warning
        } else {
            Self::OverBudget
        }
    }

    /// Severity rank for ordering (UNKNOWN has none)
    pub fn severity(&self) -> Option<u8> {
        match self {
            Self::Healthy => Some(0),
            Self::Warning => Some(1),
            Self::OverBudget => Some(2),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of the analysis stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub total: f64,
    pub daily_rate: f64,
    pub monthly_projection: f64,
    pub days_analyzed: u32,
    pub income: Option<f64>,
    /// Subtotal per category; categories with no records are omitted
    pub category_breakdown: BTreeMap<ExpenseCategory, f64>,
    pub budget_status: BudgetStatus,
    pub usage_percentage: Option<f64>,
    pub remaining_budget: Option<f64>,
    /// Human-readable high-share category notes, highest share first
    pub trends: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Share of total for a category, as a percentage (0 when total is 0)
    pub fn share_of(&self, category: ExpenseCategory) -> f64 {
        if self.total <= 0.0 {
            return 0.0;
        }
        self.category_breakdown
            .get(&category)
            .map(|amount| amount / self.total * 100.0)
            .unwrap_or(0.0)
    }

    /// Highest-spending category; ties go to the first declared category
    pub fn top_category(&self) -> Option<(ExpenseCategory, f64)> {
        self.category_breakdown
            .iter()
            .fold(None, |best: Option<(ExpenseCategory, f64)>, (cat, amount)| {
                match best {
                    Some((_, best_amount)) if best_amount >= *amount => best,
                    _ => Some((*cat, *amount)),
                }
            })
    }
}

/// Priority of an action item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl ActionPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }
}

impl std::fmt::Display for ActionPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub description: String,
    pub priority: ActionPriority,
    pub potential_savings: Option<f64>,
}

impl ActionItem {
    pub fn new(description: impl Into<String>, priority: ActionPriority) -> Self {
        Self {
            description: description.into(),
            priority,
            potential_savings: None,
        }
    }

    pub fn with_savings(mut self, savings: f64) -> Self {
        self.potential_savings = Some(savings);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub description: String,
    pub current_value: f64,
    pub target_value: f64,
    pub timeframe: String,
    pub category: Option<ExpenseCategory>,
}

/// Where the guidance text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuidanceSource {
    Inference,
    /// Deterministic template (inference failed or was unparsable)
    Template,
}

/// Output of the strategy stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guidance {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub action_items: Vec<ActionItem>,
    pub goals: Vec<Goal>,
    pub source: GuidanceSource,
    pub created_at: DateTime<Utc>,
}

/// Complete result of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub records: Vec<ExpenseRecord>,
    pub analysis: AnalysisResult,
    pub guidance: Guidance,
    pub processing_time_ms: u64,
}
