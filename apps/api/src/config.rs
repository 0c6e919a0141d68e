use anyhow::{Context, Result};

use crate::analysis::normalize::TerminalErrorPolicy;
use crate::llm_client::RetryConfig;

/// Application configuration loaded from environment variables.
///
/// AI-mode settings are only required when `AI_ANALYSIS_ENABLED=true`;
/// without them the service runs in heuristic-only mode.
#[derive(Debug, Clone)]
pub struct Config {
    pub ai_enabled: bool,
    pub provider_api_url: String,
    pub provider_api_key: String,
    pub provider_model: String,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    /// When true, a terminal 4xx from the provider degrades to a
    /// heuristic-only result instead of surfacing an error to the caller.
    pub terminal_4xx_degrades: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let ai_enabled = env_bool("AI_ANALYSIS_ENABLED", false)?;

        Ok(Config {
            ai_enabled,
            provider_api_url: env_or(
                "PROVIDER_API_URL",
                "https://api.anthropic.com/v1/messages",
            ),
            provider_api_key: if ai_enabled {
                require_env("PROVIDER_API_KEY")?
            } else {
                std::env::var("PROVIDER_API_KEY").unwrap_or_default()
            },
            provider_model: env_or("PROVIDER_MODEL", "claude-sonnet-4-5"),
            max_attempts: env_parse("MAX_ATTEMPTS", 3)?,
            base_delay_ms: env_parse("BASE_DELAY_MS", 500)?,
            terminal_4xx_degrades: env_bool("TERMINAL_4XX_DEGRADES", false)?,
            port: env_parse("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            base_delay_ms: self.base_delay_ms,
        }
    }

    pub fn terminal_policy(&self) -> TerminalErrorPolicy {
        if self.terminal_4xx_degrades {
            TerminalErrorPolicy::Degrade
        } else {
            TerminalErrorPolicy::Surface
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid number")),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => anyhow::bail!("'{key}' must be a boolean, got '{other}'"),
        },
        Err(_) => Ok(default),
    }
}
