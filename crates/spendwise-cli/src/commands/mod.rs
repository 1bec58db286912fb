//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `expenses` - Expense file loading (CSV/JSON) and shared setup (load_orchestrator)
//! - `insights` - Insight generation and free-text questions
//! - `categorize` - Category suggestion
//! - `providers` - Provider status and health checks
//! - `serve` - Web server command

pub mod categorize;
pub mod expenses;
pub mod insights;
pub mod providers;
pub mod serve;

// Re-export command functions for main.rs
pub use categorize::*;
pub use expenses::*;
pub use insights::*;
pub use providers::*;
pub use serve::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
