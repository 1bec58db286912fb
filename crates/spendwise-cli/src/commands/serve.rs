//! Server command implementation

use anyhow::Result;
use spendwise_core::AiOrchestrator;
use spendwise_server::ServerConfig;

pub async fn cmd_serve(
    orchestrator: AiOrchestrator,
    host: &str,
    port: u16,
    no_auth: bool,
) -> Result<()> {
    println!("🚀 Starting Spendwise web server...");
    println!("   Listening: http://{}:{}", host, port);

    let config = ServerConfig::from_env(!no_auth);

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else if config.api_keys.is_empty() {
        println!("   🔒 Authentication: API key required, but none configured");
        println!("      Set SPENDWISE_API_KEYS (comma-separated) or use --no-auth locally");
    } else {
        println!(
            "   🔑 API keys: {} configured (SPENDWISE_API_KEYS)",
            config.api_keys.len()
        );
    }
    if !config.allowed_origins.is_empty() {
        println!(
            "   🌐 Allowed origins: {} (SPENDWISE_ALLOWED_ORIGINS)",
            config.allowed_origins.join(", ")
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    spendwise_server::serve(orchestrator, host, port, config).await?;

    Ok(())
}
