//! Provider status command

use anyhow::Result;
use spendwise_core::{AiOrchestrator, HealthStatus};

/// List providers in attempt order, optionally probing each one
pub async fn cmd_providers(orchestrator: &AiOrchestrator, check: bool) -> Result<()> {
    println!("🔌 AI providers\n");

    for info in orchestrator.provider_info() {
        let state = if info.configured {
            "✅ configured".to_string()
        } else {
            format!("❌ not configured (set {})", info.id.credential_env())
        };
        println!("  {:<8} {}", info.name, state);
        println!("           models: {}", info.models.join(", "));
    }

    if let Some(preferred) = orchestrator.config().preferred {
        println!("\n  Preferred: {}", preferred.display_name());
    }

    if !check {
        return Ok(());
    }

    println!("\n🩺 Health check...\n");
    for health in orchestrator.check_health().await {
        let latency = health
            .latency_ms
            .map(|ms| format!(" ({} ms)", ms))
            .unwrap_or_default();
        let status = match &health.status {
            HealthStatus::Healthy => "✅ healthy".to_string(),
            HealthStatus::RateLimited => "⏳ rate limited".to_string(),
            HealthStatus::Unconfigured => "➖ unconfigured".to_string(),
            HealthStatus::Error(msg) => format!("❌ {}", super::truncate(msg, 80)),
        };
        println!("  {:<8} {}{}", health.provider.display_name(), status, latency);
    }

    Ok(())
}
