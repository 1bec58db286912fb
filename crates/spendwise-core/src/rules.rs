//! Deterministic insights
//!
//! Used when no provider can answer, for users with no expenses yet, and for
//! the budget-status insight that is added to every non-welcome batch. No
//! network access; same input always produces the same output.

use chrono::{Datelike, NaiveDate};

use crate::models::{BudgetContext, BudgetStatus, ExpenseRecord, Insight, InsightType};
use crate::stats::SpendingSummary;

/// Id of the budget-status insight
pub const BUDGET_INSIGHT_ID: &str = "budget-analysis";

const HIGH_SPENDING_THRESHOLD: f64 = 10_000.0;
const LOW_SPENDING_THRESHOLD: f64 = 1_000.0;
const CONCENTRATION_SHARE: f64 = 40.0;
const DIVERSE_CATEGORY_COUNT: usize = 4;
const PROJECTION_MIN_DAYS: u32 = 7;
const PROJECTION_CONFIDENT_DAYS: u32 = 14;
const FREQUENT_TRANSACTIONS_PER_DAY: f64 = 3.0;
const PROJECTION_DAYS: f64 = 30.0;

/// Insights shown before any expense has been recorded
pub fn welcome_insights() -> Vec<Insight> {
    vec![
        Insight::new(
            "welcome-1",
            InsightType::Info,
            "Welcome to ExpenseTracker AI!",
            "Start adding your expenses to get personalized AI insights about your spending patterns, budget recommendations, and financial advice.",
            1.0,
        )
        .with_action("Add your first expense"),
        Insight::new(
            "welcome-2",
            InsightType::Tip,
            "Track Regularly",
            "For best results, log your expenses daily. This helps provide more accurate insights and personalized recommendations.",
            1.0,
        )
        .with_action("Set daily reminders"),
    ]
}

/// Single insight returned when no provider credential exists at all
pub fn configuration_required_insight() -> Insight {
    Insight::new(
        "api-key-missing",
        InsightType::Warning,
        "API Configuration Required",
        "Please configure GROQ_API_KEY or GEMINI_API_KEY to enable AI insights.",
        1.0,
    )
    .with_action("Configure API keys")
}

/// Rule-based analysis of the expense list
///
/// Empty input yields the welcome set. Non-empty input always yields at
/// least the average-spending insight.
pub fn rule_based_insights(expenses: &[ExpenseRecord]) -> Vec<Insight> {
    if expenses.is_empty() {
        return welcome_insights();
    }

    let summary = SpendingSummary::from_expenses(expenses);
    let days = summary.span_days;
    let daily_average = summary.daily_average();
    let mut insights = Vec::new();

    if summary.total > HIGH_SPENDING_THRESHOLD {
        insights.push(
            Insight::new(
                "high-spending",
                InsightType::Warning,
                "High Total Spending Detected",
                format!(
                    "Your total expenses over the last {} days are ₹{:.2}. This averages to ₹{:.2} per day. Consider reviewing your spending patterns to identify areas for cost reduction.",
                    days, summary.total, daily_average
                ),
                0.9,
            )
            .with_action("Get spending reduction tips")
            .with_amount(summary.total),
        );
    } else if summary.total < LOW_SPENDING_THRESHOLD {
        insights.push(
            Insight::new(
                "low-spending",
                InsightType::Success,
                "Great Spending Control",
                format!(
                    "Your total expenses are ₹{:.2} over {} days. You're maintaining good control over your spending! Keep tracking to maintain this discipline.",
                    summary.total, days
                ),
                0.85,
            )
            .with_action("Set savings goals"),
        );
    }

    if let Some((top, top_total)) = summary.top_category() {
        let share = summary.top_category_share();
        if share > CONCENTRATION_SHARE {
            insights.push(
                Insight::new(
                    "category-concentration",
                    InsightType::Info,
                    format!("{} Dominates Your Spending", top),
                    format!(
                        "{} accounts for ₹{:.2} ({:.1}%) of your total expenses. Consider diversifying your spending or finding ways to optimize costs in this category.",
                        top, top_total, share
                    ),
                    0.95,
                )
                .with_action(format!("Get {} optimization tips", top))
                .with_category(top)
                .with_amount(top_total),
            );
        }
    }

    let categories = summary.category_names();
    if categories.len() >= DIVERSE_CATEGORY_COUNT {
        insights.push(
            Insight::new(
                "category-diversity",
                InsightType::Success,
                "Well-Diversified Spending",
                format!(
                    "You're tracking expenses across {} different categories: {}. This diversity helps in better financial planning and budget allocation.",
                    categories.len(),
                    categories.join(", ")
                ),
                0.8,
            )
            .with_action("View category breakdown"),
        );
    }

    insights.push(
        Insight::new(
            "average-spending",
            InsightType::Info,
            "Spending Pattern Analysis",
            format!(
                "Your average expense per transaction is ₹{:.2}. You've recorded {} transactions over {} days, averaging ₹{:.2} per day.",
                summary.average, summary.count, days, daily_average
            ),
            0.9,
        )
        .with_action("Analyze spending trends")
        .with_amount(summary.average),
    );

    if days >= PROJECTION_MIN_DAYS {
        let estimate = daily_average * PROJECTION_DAYS;
        let confidence = if days >= PROJECTION_CONFIDENT_DAYS { 0.9 } else { 0.7 };
        insights.push(
            Insight::new(
                "monthly-projection",
                InsightType::Tip,
                "Monthly Spending Projection",
                format!(
                    "Based on your current spending rate of ₹{:.2} per day, you're projected to spend approximately ₹{:.2} this month. Set a monthly budget to ensure you stay within your financial goals.",
                    daily_average, estimate
                ),
                confidence,
            )
            .with_action("Create monthly budget plan")
            .with_amount(estimate),
        );
    }

    let per_day = summary.transactions_per_day();
    if per_day > FREQUENT_TRANSACTIONS_PER_DAY {
        insights.push(
            Insight::new(
                "frequent-spending",
                InsightType::Warning,
                "Frequent Small Transactions",
                format!(
                    "You're making an average of {:.1} transactions per day. Consider consolidating smaller purchases or reviewing if all expenses are necessary to better manage your cash flow.",
                    per_day
                ),
                0.8,
            )
            .with_action("Review transaction frequency"),
        );
    }

    insights
}

/// "Monthly Budget Status" insight for a positive budget
///
/// `today` drives the month-end projection; pass the caller's current date.
pub fn budget_insight(budget: &BudgetContext, today: NaiveDate) -> Option<Insight> {
    if budget.monthly_budget <= 0.0 {
        return None;
    }

    let percentage = budget.percentage_used();
    let remaining = budget.remaining();
    let projected = budget.current_spending / f64::from(today.day()) * f64::from(days_in_month(today));

    let (insight_type, message, action) = match budget.status() {
        BudgetStatus::OverBudget => (
            InsightType::Warning,
            format!(
                "You've exceeded your monthly budget of ₹{:.2}. Current spending: ₹{:.2} ({:.1}% of budget). You've overspent by ₹{:.2}.",
                budget.monthly_budget,
                budget.current_spending,
                percentage,
                remaining.abs()
            ),
            "Get budget recovery plan",
        ),
        BudgetStatus::NearingLimit => (
            InsightType::Warning,
            format!(
                "You're approaching your monthly budget limit. Budget: ₹{:.2}, Current: ₹{:.2} ({:.1}%). Remaining: ₹{:.2}.",
                budget.monthly_budget, budget.current_spending, percentage, remaining
            ),
            "Get spending reduction tips",
        ),
        BudgetStatus::WithinBudget => (
            InsightType::Success,
            format!(
                "You're within budget! Monthly budget: ₹{:.2}, Current spending: ₹{:.2} ({:.1}%). Remaining: ₹{:.2}. Projected monthly spending: ₹{:.2}.",
                budget.monthly_budget, budget.current_spending, percentage, remaining, projected
            ),
            "View budget details",
        ),
    };

    Some(
        Insight::new(BUDGET_INSIGHT_ID, insight_type, "Monthly Budget Status", message, 0.95)
            .with_action(action)
            .with_amount(budget.current_spending),
    )
}

/// Prepend the budget insight unless the batch already has one
pub fn with_budget_insight(
    mut insights: Vec<Insight>,
    budget: Option<&BudgetContext>,
    today: NaiveDate,
) -> Vec<Insight> {
    if insights.iter().any(|i| i.id == BUDGET_INSIGHT_ID) {
        return insights;
    }
    if let Some(insight) = budget.and_then(|b| budget_insight(b, today)) {
        insights.insert(0, insight);
    }
    insights
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}
