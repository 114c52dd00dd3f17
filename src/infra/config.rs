//! Centralized configuration (environment variables + defaults).

use anyhow::{anyhow, Context};
use std::time::Duration;

pub const DEFAULT_DIDIT_BASE_URL: &str = "https://verification.didit.me";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub didit: DiditConfig,
    /// Shared secret used to sign webhook bodies.
    pub webhook_secret: String,
    /// Allowed clock skew for the webhook timestamp header, in seconds.
    pub webhook_tolerance_secs: u64,
    /// Postgres connection string. The in-memory store is used when unset.
    pub database_url: Option<String>,
    pub bind_addr: String,
}

#[derive(Debug, Clone)]
pub struct DiditConfig {
    pub base_url: String,
    pub api_key: String,
    pub workflow_id: String,
    /// Where the vendor redirects the user after the hosted flow.
    pub callback_url: Option<String>,
    pub timeout: Duration,
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| anyhow!("{} must be set", key));

        let webhook_tolerance_secs = match get("WEBHOOK_TOLERANCE_SECS") {
            Some(v) => v
                .parse::<u64>()
                .with_context(|| format!("WEBHOOK_TOLERANCE_SECS must be a valid u64, got '{}'", v))?,
            None => crate::crypto::DEFAULT_TOLERANCE_SECS,
        };
        let timeout_secs = match get("DIDIT_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .with_context(|| format!("DIDIT_TIMEOUT_SECS must be a valid u64, got '{}'", v))?
                .max(1),
            None => 15,
        };

        Ok(Self {
            didit: DiditConfig {
                base_url: get("DIDIT_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_DIDIT_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                api_key: require("DIDIT_API_KEY")?,
                workflow_id: require("DIDIT_WORKFLOW_ID")?,
                callback_url: get("DIDIT_CALLBACK_URL"),
                timeout: Duration::from_secs(timeout_secs),
            },
            webhook_secret: require("DIDIT_WEBHOOK_SECRET")?,
            webhook_tolerance_secs,
            database_url: get("DATABASE_URL"),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}
