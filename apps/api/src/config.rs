use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_VAPI_BASE_URL: &str = "https://api.vapi.ai";
const DEFAULT_REPEAT_GRACE_MS: u64 = 1000;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without it the in-memory store is used.
    pub database_url: Option<String>,
    pub anthropic_api_key: String,
    pub vapi_api_key: Option<String>,
    pub vapi_base_url: String,
    /// Workflow for generic "generate new interview" calls.
    pub vapi_workflow_id: Option<String>,
    /// Delay between stopping a call and restarting it on repeat.
    pub call_repeat_grace: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let repeat_grace_ms = match optional_env("CALL_REPEAT_GRACE_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("CALL_REPEAT_GRACE_MS must be a whole number of milliseconds")?,
            None => DEFAULT_REPEAT_GRACE_MS,
        };

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            vapi_api_key: optional_env("VAPI_API_KEY"),
            vapi_base_url: optional_env("VAPI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_VAPI_BASE_URL.to_string()),
            vapi_workflow_id: optional_env("VAPI_WORKFLOW_ID"),
            call_repeat_grace: Duration::from_millis(repeat_grace_ms),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values both read as `None`.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
