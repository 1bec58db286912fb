//! Spendwise CLI - AI-assisted expense insights
//!
//! Usage:
//!   spendwise insights --file expenses.csv    Generate insights
//!   spendwise ask "How can I save on food?"    Ask a financial question
//!   spendwise categorize "uber to airport"     Suggest a category
//!   spendwise providers --check                Check AI providers
//!   spendwise serve --port 3000                Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let orchestrator = commands::load_orchestrator(cli.config.as_deref())?;

    match cli.command {
        Commands::Insights {
            file,
            budget,
            prefer,
            json,
        } => commands::cmd_insights(&orchestrator, &file, &budget, prefer, json).await,
        Commands::Ask {
            question,
            budget,
            prefer,
        } => commands::cmd_ask(&orchestrator, &question, &budget, prefer).await,
        Commands::Categorize { description } => {
            commands::cmd_categorize(&orchestrator, &description).await
        }
        Commands::Providers { check } => commands::cmd_providers(&orchestrator, check).await,
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(orchestrator, &host, port, no_auth).await,
    }
}
