//! Expense file loading and shared setup
//!
//! This module contains:
//! - `load_orchestrator` - Build the orchestrator from config layers
//! - `load_expenses` - Read expense records from a CSV or JSON file

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use spendwise_core::{AiConfig, AiOrchestrator, ExpenseRecord};

/// Build the orchestrator from embedded defaults, the override file, and env
pub fn load_orchestrator(config_path: Option<&Path>) -> Result<AiOrchestrator> {
    let config = AiConfig::load(config_path).context("Failed to load AI provider config")?;
    Ok(AiOrchestrator::new(config))
}

/// One CSV row: `id,amount,category,description,date` (id and description optional)
#[derive(Debug, Deserialize)]
struct CsvExpense {
    #[serde(default)]
    id: Option<String>,
    amount: f64,
    category: String,
    #[serde(default)]
    description: Option<String>,
    date: String,
}

/// Load expenses from a `.csv` or `.json` file
pub fn load_expenses(path: &Path) -> Result<Vec<ExpenseRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => load_json(path),
        Some("csv") => load_csv(path),
        _ => bail!(
            "Unsupported expense file {} (expected .csv or .json)",
            path.display()
        ),
    }
}

fn load_json(path: &Path) -> Result<Vec<ExpenseRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid expense JSON in {}", path.display()))
}

fn load_csv(path: &Path) -> Result<Vec<ExpenseRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut expenses = Vec::new();
    for (index, row) in reader.deserialize::<CsvExpense>().enumerate() {
        // Header is line 1
        let line = index + 2;
        let row = row.with_context(|| format!("Invalid expense on line {}", line))?;
        let date = parse_date(&row.date)
            .with_context(|| format!("Invalid date '{}' on line {}", row.date, line))?;

        expenses.push(ExpenseRecord {
            id: row
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| (index + 1).to_string()),
            amount: row.amount,
            category: row.category,
            description: row.description.filter(|d| !d.is_empty()),
            date,
        });
    }

    Ok(expenses)
}

/// Accept RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC)
fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .context("Date out of range")
}
