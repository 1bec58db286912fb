//! Prompt rendering for the three AI operations
//!
//! Every prompt carries an explicit output contract: a JSON array for
//! insights, plain prose for answers, a single label for categories.
//! Amounts are rendered in Indian Rupees (₹).

use serde::Serialize;

use crate::models::{BudgetContext, Category, ExpenseRecord};
use crate::stats::{most_recent, SpendingSummary};

/// Number of recent expenses embedded in the insights prompt
pub const RECENT_EXPENSE_LIMIT: usize = 10;

pub const INSIGHTS_SYSTEM_PROMPT: &str = "You are a financial advisor AI. Always respond with valid JSON only. Use Indian Rupees (₹) for currency.";

pub const ANSWER_SYSTEM_PROMPT: &str = "You are a helpful financial advisor for Indian users. Respond in plain, conversational text. Never use JSON or code blocks. Use Indian Rupees (₹) for currency.";

pub const CATEGORY_SYSTEM_PROMPT: &str = "You are a category classifier. Return only the category name from the given options. Be precise and concise.";

/// Tiny prompt used by health checks
pub const HEALTH_CHECK_PROMPT: &str = "Reply with the single word OK.";

const CATEGORY_EXAMPLES: &[(&str, Category)] = &[
    ("coffee at starbucks", Category::Food),
    ("uber ride to work", Category::Transportation),
    ("netflix subscription", Category::Entertainment),
    ("medicine from pharmacy", Category::Healthcare),
    ("electricity bill payment", Category::Bills),
    ("bought new shoes", Category::Shopping),
];

/// Compact expense view embedded in the insights prompt
#[derive(Serialize)]
struct PromptExpense<'a> {
    amount: f64,
    category: &'a str,
    description: &'a str,
    date: String,
}

fn budget_block(heading: &str, budget: &BudgetContext) -> String {
    format!(
        "\n\n{}:\n- Monthly Budget: ₹{:.2}\n- Current Month Spending: ₹{:.2}\n- Budget Usage: {:.1}%\n- Remaining Budget: ₹{:.2}\n- Status: {}",
        heading,
        budget.monthly_budget,
        budget.current_spending,
        budget.percentage_used(),
        budget.remaining(),
        budget.status().label(),
    )
}

/// Budget context is only rendered for a positive monthly budget
fn usable_budget(budget: Option<&BudgetContext>) -> Option<&BudgetContext> {
    budget.filter(|b| b.monthly_budget > 0.0)
}

/// Render the insights prompt
///
/// Callers short-circuit empty expense lists to the welcome set, but an empty
/// list still renders (with zero aggregates).
pub fn insights_prompt(expenses: &[ExpenseRecord], budget: Option<&BudgetContext>) -> String {
    let summary = SpendingSummary::from_expenses(expenses);
    let budget = usable_budget(budget);

    let (top_name, top_total) = summary.top_category().unwrap_or(("None", 0.0));

    let recent: Vec<PromptExpense> = most_recent(expenses, RECENT_EXPENSE_LIMIT)
        .into_iter()
        .map(|e| PromptExpense {
            amount: e.amount,
            category: &e.category,
            description: e
                .description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or("N/A"),
            date: e.date.to_rfc3339(),
        })
        .collect();
    // Serializing plain strings and floats cannot fail
    let recent_json = serde_json::to_string(&recent).unwrap_or_else(|_| "[]".to_string());

    let budget_context = budget
        .map(|b| budget_block("Budget Information", b))
        .unwrap_or_default();
    let with_budget = |text: &'static str| -> &'static str {
        if budget.is_some() {
            text
        } else {
            ""
        }
    };

    let mut prompt = format!(
        r#"Analyze these expense records and provide 3-5 financial insights in JSON format.

Expense Data:
- Total Expenses (Last 30 days): ₹{total:.2}
- Number of Expenses: {count}
- Average Expense: ₹{average:.2}
- Top Category: {top_name} (₹{top_total:.2})
- Categories: {categories}
- Recent Expenses: {recent_json}{budget_context}

Return ONLY a valid JSON array with this exact structure:
[
  {{
    "id": "unique-id",
    "type": "success" | "warning" | "info" | "tip",
    "title": "Short title",
    "message": "Detailed explanation",
    "action": "Optional actionable advice",
    "confidence": 0.0-1.0,
    "category": "Optional category name",
    "amount": Optional amount
  }}
]

Focus on:
1. Spending patterns and trends{compare}
2. Category-wise analysis and optimization
3. Budget recommendations and adjustments{based_on}
4. Cost-saving opportunities
5. Actionable financial advice{considering}
"#,
        total = summary.total,
        count = summary.count,
        average = summary.average,
        categories = summary.category_names().join(", "),
        compare = with_budget(" (compare with budget)"),
        based_on = with_budget(" (based on current budget)"),
        considering = with_budget(" (considering budget status)"),
    );

    if let Some(b) = budget {
        prompt.push_str(&format!(
            "\nIMPORTANT: Consider the monthly budget (₹{:.2}) and current spending (₹{:.2}) in your analysis. Provide budget-specific recommendations.\n",
            b.monthly_budget, b.current_spending
        ));
    }

    prompt.push_str("\nUse Indian Rupees (₹) for all amounts. Be practical and specific.");
    prompt
}

/// Render the free-text answer prompt
pub fn answer_prompt(question: &str, budget: Option<&BudgetContext>) -> String {
    let budget_context = usable_budget(budget)
        .map(|b| budget_block("Budget Context", b))
        .unwrap_or_default();

    format!(
        r#"You are a financial advisor for Indian users. Answer this question with practical, actionable advice in plain text format (NO JSON, NO code blocks, just natural text).

Question: {question}{budget_context}

Requirements:
- Use Indian Rupees (₹) for currency
- Provide 3-5 specific, actionable steps
- Keep response between 100-200 words
- Use bullet points or numbered list for clarity
- Focus on practical implementation
- Be encouraging but realistic
- Use simple, clear language
- Format with line breaks for readability
- DO NOT use JSON format
- DO NOT use code blocks
- Write in natural, conversational tone

Provide your answer as plain text with clear sections:"#,
        question = question.trim(),
    )
}

/// Render the single-label category prompt
pub fn category_prompt(description: &str) -> String {
    let description = description.trim();

    let options = Category::all()
        .iter()
        .map(|c| format!("- {}", c))
        .collect::<Vec<_>>()
        .join("\n");
    let examples = CATEGORY_EXAMPLES
        .iter()
        .map(|(text, category)| format!("- \"{}\" → {}", text, category))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Based on this expense description: "{description}"

Suggest the most appropriate category from these options:
{options}

Return ONLY the category name, nothing else. Choose the single best match.

Examples:
{examples}

Description: {description}
Category:"#
    )
}
