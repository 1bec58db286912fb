//! Insight and question command implementations

use std::path::Path;

use anyhow::{bail, Context, Result};
use spendwise_core::{
    AggregateError, AiOrchestrator, Error, FailureNotice, Insight, InsightReport, InsightSource,
    InsightType, ProviderId,
};

use crate::cli::BudgetArgs;

/// Generate insights for the expenses in `file`
pub async fn cmd_insights(
    orchestrator: &AiOrchestrator,
    file: &Path,
    budget: &BudgetArgs,
    prefer: Option<ProviderId>,
    json: bool,
) -> Result<()> {
    let expenses = super::load_expenses(file)?;
    let total: f64 = expenses.iter().map(|e| e.amount).sum();
    let budget = budget.context(total);

    let report = orchestrator
        .generate_expense_insights(&expenses, budget.as_ref(), prefer)
        .await;

    if json {
        let output =
            serde_json::to_string_pretty(&report).context("Failed to serialize insights")?;
        println!("{}", output);
        return Ok(());
    }

    println!(
        "📊 {} expenses, total ₹{:.2}",
        expenses.len(),
        total
    );
    if let Some(budget) = &budget {
        println!(
            "   Budget: ₹{:.2} ({:.1}% used, {})",
            budget.monthly_budget,
            budget.percentage_used(),
            budget.status()
        );
    }
    println!();

    print_report(&report);
    Ok(())
}

fn print_report(report: &InsightReport) {
    match report.source {
        InsightSource::Provider(id) => println!("🤖 Insights from {}", id.display_name()),
        InsightSource::Welcome => println!("👋 No expenses yet"),
        InsightSource::Unconfigured => {
            println!("🔑 {}", FailureNotice::ConfigurationMissing.title())
        }
        InsightSource::RuleBased => {
            let notice = FailureNotice::from_aggregate(&AggregateError::new(report.attempts.clone()));
            println!("📐 Rule-based insights ({})", notice.title());
            for attempt in &report.attempts {
                println!(
                    "   ⚠️  {}: {} ({})",
                    attempt.provider.display_name(),
                    attempt.message,
                    attempt.kind
                );
            }
        }
    }
    println!();

    for insight in &report.insights {
        print_insight(insight);
    }
}

fn print_insight(insight: &Insight) {
    let icon = match insight.insight_type {
        InsightType::Success => "✅",
        InsightType::Warning => "⚠️ ",
        InsightType::Info => "ℹ️ ",
        InsightType::Tip => "💡",
    };
    println!("{} {}", icon, insight.title);
    println!("   {}", insight.message);
    if let Some(action) = &insight.action {
        println!("   → {}", action);
    }
    println!();
}

/// Answer a free-text financial question
pub async fn cmd_ask(
    orchestrator: &AiOrchestrator,
    question: &str,
    budget: &BudgetArgs,
    prefer: Option<ProviderId>,
) -> Result<()> {
    let budget = budget.context(0.0);

    match orchestrator
        .generate_financial_answer(question, budget.as_ref(), prefer)
        .await
    {
        Ok(answer) => {
            println!("{}", answer.text);
            println!();
            println!("   (via {})", answer.provider.display_name());
            Ok(())
        }
        Err(Error::AllProvidersFailed(err)) => {
            let notice = FailureNotice::from_aggregate(&err);
            println!("❌ {}", notice.title());
            println!("   {}", notice.message());
            for attempt in &err.attempts {
                println!(
                    "   - {}: {}",
                    attempt.provider.display_name(),
                    attempt.message
                );
            }
            bail!(err)
        }
        Err(e) => Err(e.into()),
    }
}
