//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use spendwise_core::{BudgetContext, ProviderId};

/// Spendwise - AI insights for your expenses
#[derive(Parser)]
#[command(name = "spendwise")]
#[command(about = "AI-assisted expense insights with multi-provider fallback", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Provider config override (TOML)
    ///
    /// Defaults to <data dir>/spendwise/config/ai.toml when present.
    /// Credentials always come from GROQ_API_KEY / GEMINI_API_KEY.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Monthly budget figures
#[derive(Args, Debug, Clone, Default)]
pub struct BudgetArgs {
    /// Monthly budget amount
    #[arg(long)]
    pub budget: Option<f64>,

    /// Amount already spent this month (defaults to the loaded expenses' total)
    #[arg(long)]
    pub spent: Option<f64>,
}

impl BudgetArgs {
    /// Budget context, or None when no positive budget was given
    pub fn context(&self, default_spent: f64) -> Option<BudgetContext> {
        self.budget
            .filter(|b| *b > 0.0)
            .map(|b| BudgetContext::new(b, self.spent.unwrap_or(default_spent)))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate spending insights from an expense file
    Insights {
        /// Expense file (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        budget: BudgetArgs,

        /// Provider to try first (groq, gemini)
        #[arg(long)]
        prefer: Option<ProviderId>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask a free-text financial question
    Ask {
        /// The question
        question: String,

        #[command(flatten)]
        budget: BudgetArgs,

        /// Provider to try first (groq, gemini)
        #[arg(long)]
        prefer: Option<ProviderId>,
    },

    /// Suggest a category for an expense description
    Categorize {
        /// Expense description (max 200 characters)
        description: String,
    },

    /// Show configured AI providers
    Providers {
        /// Check each provider with a tiny request
        #[arg(long)]
        check: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, the server requires a bearer key from SPENDWISE_API_KEYS.
        #[arg(long)]
        no_auth: bool,
    },
}
