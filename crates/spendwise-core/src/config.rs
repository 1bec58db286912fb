//! AI provider configuration
//!
//! Everything the orchestrator needs is carried in an explicit `AiConfig`:
//! provider order, per-provider model fallback lists and credentials, and
//! per-operation timeout / token budget / temperature.
//!
//! ## Configuration Resolution
//!
//! 1. Embedded defaults (`config/ai.toml`, compiled into the binary)
//! 2. Override file: explicit path, or ~/.local/share/spendwise/config/ai.toml
//! 3. Environment: `GROQ_API_KEY`, `GEMINI_API_KEY`, `GROQ_BASE_URL`,
//!    `GEMINI_BASE_URL`, `SPENDWISE_PREFERRED_PROVIDER`

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ai::ProviderId;
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/ai.toml");

/// The three AI-backed operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Structured insight generation (JSON array output)
    Insights,
    /// Free-text financial answer
    Answer,
    /// Single-label category classification
    Category,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insights => "insights",
            Self::Answer => "answer",
            Self::Category => "category",
        }
    }
}

/// Per-operation request shaping
#[derive(Debug, Clone, PartialEq)]
pub struct OperationConfig {
    /// Upper bound for one provider attempt
    pub timeout: Duration,
    /// Response-size cap sent to the provider
    pub max_tokens: u32,
    pub temperature: f32,
}

/// One provider's connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub api_key: Option<String>,
    pub base_url: String,
    /// Model identifiers in preference order
    pub models: Vec<String>,
    /// API versions in preference order (only used by providers that version their paths)
    pub api_versions: Vec<String>,
}

impl ProviderConfig {
    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Full orchestrator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    /// Providers in attempt order
    pub providers: Vec<ProviderConfig>,
    /// Provider moved to the front of the order
    pub preferred: Option<ProviderId>,
    pub insights: OperationConfig,
    pub answer: OperationConfig,
    pub category: OperationConfig,
    pub health_timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        // The embedded file is covered by tests; fall back to hardcoded values if it ever breaks
        parse_config(DEFAULT_CONFIG).unwrap_or_else(|_| Self::builtin())
    }
}

impl AiConfig {
    fn builtin() -> Self {
        Self {
            providers: vec![
                ProviderConfig {
                    id: ProviderId::Groq,
                    api_key: None,
                    base_url: "https://api.groq.com".to_string(),
                    models: vec!["llama-3.1-8b-instant".to_string()],
                    api_versions: vec![],
                },
                ProviderConfig {
                    id: ProviderId::Gemini,
                    api_key: None,
                    base_url: "https://generativelanguage.googleapis.com".to_string(),
                    models: vec!["gemini-1.5-flash".to_string()],
                    api_versions: vec!["v1".to_string(), "v1beta".to_string()],
                },
            ],
            preferred: None,
            insights: OperationConfig {
                timeout: Duration::from_secs(30),
                max_tokens: 1500,
                temperature: 0.7,
            },
            answer: OperationConfig {
                timeout: Duration::from_secs(15),
                max_tokens: 400,
                temperature: 0.7,
            },
            category: OperationConfig {
                timeout: Duration::from_secs(10),
                max_tokens: 50,
                temperature: 0.3,
            },
            health_timeout: Duration::from_secs(10),
        }
    }

    /// Load config from file layers and the process environment
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut config = load_config(override_path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load config using only the process environment on top of embedded defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        for provider in &mut self.providers {
            if let Some(key) = lookup(provider.id.credential_env()) {
                provider.api_key = Some(key.trim().to_string());
            }
            if let Some(url) = lookup(provider.id.base_url_env()) {
                provider.base_url = url.trim_end_matches('/').to_string();
            }
        }

        if let Some(preferred) = lookup("SPENDWISE_PREFERRED_PROVIDER") {
            match preferred.parse::<ProviderId>() {
                Ok(id) => self.preferred = Some(id),
                Err(e) => tracing::warn!(value = %preferred, "Ignoring preferred provider: {}", e),
            }
        }
    }

    /// Shaping for one operation
    pub fn operation(&self, op: Operation) -> &OperationConfig {
        match op {
            Operation::Insights => &self.insights,
            Operation::Answer => &self.answer,
            Operation::Category => &self.category,
        }
    }

    pub fn provider(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn provider_mut(&mut self, id: ProviderId) -> Option<&mut ProviderConfig> {
        self.providers.iter_mut().find(|p| p.id == id)
    }

    /// Set a credential (used by tests and embedding applications)
    pub fn with_api_key(mut self, id: ProviderId, key: &str) -> Self {
        if let Some(p) = self.provider_mut(id) {
            p.api_key = Some(key.to_string());
        }
        self
    }

    /// Point a provider at a different host (mock servers, proxies)
    pub fn with_base_url(mut self, id: ProviderId, base_url: &str) -> Self {
        if let Some(p) = self.provider_mut(id) {
            p.base_url = base_url.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_preferred(mut self, preferred: Option<ProviderId>) -> Self {
        self.preferred = preferred;
        self
    }

    /// True if at least one provider has a credential
    pub fn has_credentials(&self) -> bool {
        self.providers.iter().any(ProviderConfig::has_credential)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("spendwise").join("config").join("ai.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<AiConfig> {
    let content = match override_path {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?,
        None => match default_config_path() {
            Some(default_path) if default_path.exists() => fs::read_to_string(&default_path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?,
            _ => DEFAULT_CONFIG.to_string(),
        },
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    orchestrator: Option<RawOrchestrator>,
    providers: Option<HashMap<String, RawProvider>>,
    operations: Option<HashMap<String, RawOperation>>,
}

#[derive(Debug, Deserialize)]
struct RawOrchestrator {
    order: Option<Vec<String>>,
    preferred: Option<String>,
    health_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawProvider {
    base_url: Option<String>,
    models: Option<Vec<String>>,
    api_versions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawOperation {
    timeout_secs: Option<u64>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

/// Parse config from TOML content, layering it over the builtin values
fn parse_config(content: &str) -> Result<AiConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AiConfig::builtin();

    if let Some(orchestrator) = raw.orchestrator {
        if let Some(order) = orchestrator.order {
            let mut providers = Vec::new();
            for name in order {
                let id: ProviderId = name.parse().map_err(Error::Config)?;
                if providers.iter().any(|p: &ProviderConfig| p.id == id) {
                    return Err(Error::Config(format!("Provider listed twice: {}", id)));
                }
                if let Some(existing) = config.provider(id) {
                    providers.push(existing.clone());
                }
            }
            if providers.is_empty() {
                return Err(Error::Config("Provider order must not be empty".into()));
            }
            config.providers = providers;
        }
        if let Some(preferred) = orchestrator.preferred {
            config.preferred = Some(preferred.parse().map_err(Error::Config)?);
        }
        if let Some(secs) = orchestrator.health_timeout_secs {
            config.health_timeout = Duration::from_secs(secs);
        }
    }

    if let Some(providers) = raw.providers {
        for (name, raw_provider) in providers {
            let id: ProviderId = name.parse().map_err(Error::Config)?;
            // Providers left out of the order are ignored
            let Some(provider) = config.provider_mut(id) else {
                continue;
            };
            if let Some(url) = raw_provider.base_url {
                provider.base_url = url.trim_end_matches('/').to_string();
            }
            if let Some(models) = raw_provider.models {
                if models.is_empty() {
                    return Err(Error::Config(format!("{} needs at least one model", id)));
                }
                provider.models = models;
            }
            if let Some(versions) = raw_provider.api_versions {
                provider.api_versions = versions;
            }
        }
    }

    if let Some(operations) = raw.operations {
        for (name, raw_op) in operations {
            let op = match name.as_str() {
                "insights" => &mut config.insights,
                "answer" => &mut config.answer,
                "category" => &mut config.category,
                _ => continue, // Skip unknown operations
            };
            if let Some(secs) = raw_op.timeout_secs {
                op.timeout = Duration::from_secs(secs);
            }
            if let Some(tokens) = raw_op.max_tokens {
                op.max_tokens = tokens;
            }
            if let Some(temperature) = raw_op.temperature {
                op.temperature = temperature;
            }
        }
    }

    Ok(config)
}
