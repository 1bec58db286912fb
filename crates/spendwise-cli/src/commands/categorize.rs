//! Category suggestion command

use anyhow::Result;
use spendwise_core::{AiOrchestrator, SuggestionSource};

pub async fn cmd_categorize(orchestrator: &AiOrchestrator, description: &str) -> Result<()> {
    let suggestion = orchestrator.suggest_category(description).await?;

    let via = match suggestion.source {
        SuggestionSource::Provider(id) => id.display_name().to_string(),
        SuggestionSource::Keywords => "keyword match".to_string(),
    };
    println!("🏷️  {} ({})", suggestion.category, via);

    Ok(())
}
