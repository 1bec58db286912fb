//! Spending aggregates shared by prompt rendering and rule-based insights

use chrono::{DateTime, Utc};

use crate::models::ExpenseRecord;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Aggregates over one expense list
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingSummary {
    pub total: f64,
    pub count: usize,
    pub average: f64,
    /// Per-category totals in order of first appearance
    pub category_totals: Vec<(String, f64)>,
    /// Whole days between the oldest and newest record, rounded up, minimum 1
    pub span_days: u32,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

impl SpendingSummary {
    pub fn from_expenses(expenses: &[ExpenseRecord]) -> Self {
        let total: f64 = expenses.iter().map(|e| e.amount).sum();
        let count = expenses.len();
        let average = if count > 0 { total / count as f64 } else { 0.0 };

        let mut category_totals: Vec<(String, f64)> = Vec::new();
        for expense in expenses {
            match category_totals
                .iter_mut()
                .find(|(name, _)| *name == expense.category)
            {
                Some((_, sum)) => *sum += expense.amount,
                None => category_totals.push((expense.category.clone(), expense.amount)),
            }
        }

        let oldest = expenses.iter().map(|e| e.date).min();
        let newest = expenses.iter().map(|e| e.date).max();
        let span_days = match (oldest, newest) {
            (Some(oldest), Some(newest)) => {
                let days = (newest - oldest).num_seconds() as f64 / SECONDS_PER_DAY;
                (days.ceil() as u32).max(1)
            }
            _ => 1,
        };

        Self {
            total,
            count,
            average,
            category_totals,
            span_days,
            oldest,
            newest,
        }
    }

    /// Category with the largest total (first seen wins ties)
    pub fn top_category(&self) -> Option<(&str, f64)> {
        let mut top: Option<(&str, f64)> = None;
        for (name, sum) in &self.category_totals {
            if top.map_or(true, |(_, best)| *sum > best) {
                top = Some((name.as_str(), *sum));
            }
        }
        top
    }

    /// Share of the total spent in the top category, as a percentage
    pub fn top_category_share(&self) -> f64 {
        match self.top_category() {
            Some((_, sum)) if self.total > 0.0 => sum / self.total * 100.0,
            _ => 0.0,
        }
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.category_totals.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Average spend per day over the observed span
    pub fn daily_average(&self) -> f64 {
        self.total / f64::from(self.span_days)
    }

    pub fn transactions_per_day(&self) -> f64 {
        self.count as f64 / f64::from(self.span_days)
    }
}

/// The `limit` most recent expenses, oldest first
pub fn most_recent(expenses: &[ExpenseRecord], limit: usize) -> Vec<&ExpenseRecord> {
    let mut sorted: Vec<&ExpenseRecord> = expenses.iter().collect();
    sorted.sort_by_key(|e| e.date);
    let skip = sorted.len().saturating_sub(limit);
    sorted.into_iter().skip(skip).collect()
}
