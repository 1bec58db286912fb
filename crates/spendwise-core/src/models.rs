//! Data models for expense insights
//!
//! Inputs (`ExpenseRecord`, `BudgetContext`) are owned by the caller's record
//! store; outputs (`Insight`, `Answer`, `CategorySuggestion`) are created per
//! request and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ai::ProviderId;
use crate::error::ProviderError;

/// A single expense as supplied by the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: String,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
}

impl ExpenseRecord {
    pub fn new(
        id: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        description: Option<&str>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            category: category.into(),
            description: description.map(str::to_string),
            date,
        }
    }
}

/// Monthly budget figures derived by the caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetContext {
    pub monthly_budget: f64,
    pub current_spending: f64,
}

impl BudgetContext {
    pub fn new(monthly_budget: f64, current_spending: f64) -> Self {
        Self {
            monthly_budget,
            current_spending,
        }
    }

    /// Percentage of the budget already spent
    pub fn percentage_used(&self) -> f64 {
        if self.monthly_budget <= 0.0 {
            return 0.0;
        }
        self.current_spending / self.monthly_budget * 100.0
    }

    pub fn remaining(&self) -> f64 {
        self.monthly_budget - self.current_spending
    }

    pub fn status(&self) -> BudgetStatus {
        BudgetStatus::from_percentage(self.percentage_used())
    }
}

/// Budget health label embedded in prompts and budget insights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    WithinBudget,
    NearingLimit,
    OverBudget,
}

impl BudgetStatus {
    /// Over when strictly above 100%, nearing from 80% inclusive
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage > 100.0 {
            Self::OverBudget
        } else if percentage >= 80.0 {
            Self::NearingLimit
        } else {
            Self::WithinBudget
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::WithinBudget => "WITHIN BUDGET",
            Self::NearingLimit => "NEARING LIMIT",
            Self::OverBudget => "OVER BUDGET",
        }
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Kind of insight, drives how surfaces render it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Success,
    Warning,
    Info,
    Tip,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::Success => "success",
            InsightType::Warning => "warning",
            InsightType::Info => "info",
            InsightType::Tip => "tip",
        }
    }

    /// Lenient conversion used for provider output; unknown values become `Info`
    pub fn from_lenient(s: &str) -> Self {
        s.parse().unwrap_or(InsightType::Info)
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "success" => Ok(InsightType::Success),
            "warning" => Ok(InsightType::Warning),
            "info" => Ok(InsightType::Info),
            "tip" => Ok(InsightType::Tip),
            _ => Err(format!("Unknown insight type: {}", s)),
        }
    }
}

/// One user-facing observation about spending behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Unique within one batch only
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub message: String,
    /// Suggested follow-up prompt text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl Insight {
    pub fn new(
        id: impl Into<String>,
        insight_type: InsightType,
        title: impl Into<String>,
        message: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: id.into(),
            insight_type,
            title: title.into(),
            message: message.into(),
            action: None,
            confidence: confidence.clamp(0.0, 1.0),
            category: None,
            amount: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// Where an insight batch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "provider", rename_all = "snake_case")]
pub enum InsightSource {
    /// A live provider answered
    Provider(ProviderId),
    /// Every provider failed; deterministic analysis was used
    RuleBased,
    /// No expenses yet
    Welcome,
    /// No provider has a credential; only the configuration notice is returned
    Unconfigured,
}

impl InsightSource {
    pub fn is_degraded(&self) -> bool {
        matches!(self, InsightSource::RuleBased)
    }
}

/// Result of insight generation. `insights` is never empty.
#[derive(Debug, Clone, Serialize)]
pub struct InsightReport {
    pub insights: Vec<Insight>,
    pub source: InsightSource,
    /// Failed provider attempts, in order (empty when the first provider succeeded)
    pub attempts: Vec<ProviderError>,
}

/// A cleaned free-text answer and the provider that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    pub provider: ProviderId,
}

/// Closed set of expense categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transportation,
    Shopping,
    Entertainment,
    Bills,
    Healthcare,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Bills => "Bills",
            Category::Healthcare => "Healthcare",
            Category::Other => "Other",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Category::Food,
            Category::Transportation,
            Category::Shopping,
            Category::Entertainment,
            Category::Bills,
            Category::Healthcare,
            Category::Other,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// How a category suggestion was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "provider", rename_all = "snake_case")]
pub enum SuggestionSource {
    Provider(ProviderId),
    Keywords,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySuggestion {
    pub category: Category,
    pub source: SuggestionSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_status_thresholds() {
        assert_eq!(BudgetStatus::from_percentage(50.0), BudgetStatus::WithinBudget);
        assert_eq!(BudgetStatus::from_percentage(79.9), BudgetStatus::WithinBudget);
        assert_eq!(BudgetStatus::from_percentage(80.0), BudgetStatus::NearingLimit);
        assert_eq!(BudgetStatus::from_percentage(85.0), BudgetStatus::NearingLimit);
        assert_eq!(BudgetStatus::from_percentage(100.0), BudgetStatus::NearingLimit);
        assert_eq!(BudgetStatus::from_percentage(105.0), BudgetStatus::OverBudget);
    }

    #[test]
    fn test_budget_context_ratios() {
        assert_eq!(BudgetContext::new(10_000.0, 5_000.0).status().label(), "WITHIN BUDGET");
        assert_eq!(BudgetContext::new(10_000.0, 8_500.0).status().label(), "NEARING LIMIT");
        assert_eq!(BudgetContext::new(10_000.0, 10_500.0).status().label(), "OVER BUDGET");
        assert_eq!(BudgetContext::new(10_000.0, 8_500.0).remaining(), 1_500.0);
    }

    #[test]
    fn test_budget_zero_does_not_divide() {
        let budget = BudgetContext::new(0.0, 500.0);
        assert_eq!(budget.percentage_used(), 0.0);
    }

    #[test]
    fn test_insight_type_lenient() {
        assert_eq!(InsightType::from_lenient("WARNING"), InsightType::Warning);
        assert_eq!(InsightType::from_lenient("alert"), InsightType::Info);
        assert_eq!(InsightType::from_lenient(""), InsightType::Info);
    }

    #[test]
    fn test_insight_serializes_type_field() {
        let insight = Insight::new("a", InsightType::Tip, "T", "M", 0.7).with_amount(12.5);
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["type"], "tip");
        assert_eq!(json["amount"], 12.5);
        assert!(json.get("action").is_none());
    }

    #[test]
    fn test_insight_confidence_clamped() {
        assert_eq!(Insight::new("a", InsightType::Info, "T", "M", 1.7).confidence, 1.0);
        assert_eq!(Insight::new("a", InsightType::Info, "T", "M", -0.2).confidence, 0.0);
    }

    #[test]
    fn test_category_from_str_case_insensitive() {
        assert_eq!("food".parse::<Category>().unwrap(), Category::Food);
        assert_eq!(" HEALTHCARE ".parse::<Category>().unwrap(), Category::Healthcare);
        assert!("Groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_insight_source_serialization() {
        let json = serde_json::to_value(InsightSource::Provider(ProviderId::Groq)).unwrap();
        assert_eq!(json["kind"], "provider");
        assert_eq!(json["provider"], "groq");
        let json = serde_json::to_value(InsightSource::RuleBased).unwrap();
        assert_eq!(json["kind"], "rule_based");
        let json = serde_json::to_value(InsightSource::Unconfigured).unwrap();
        assert_eq!(json["kind"], "unconfigured");
        assert!(!InsightSource::Unconfigured.is_degraded());
    }
}
