use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub openai_api_key: String,
    /// Override for the reminder loop interval, in seconds
    pub reminder_interval_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            openai_api_key: env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?,
            reminder_interval_secs: env::var("REMINDER_INTERVAL_SECS")
                .ok()
                .map(|v| v.parse().context("REMINDER_INTERVAL_SECS must be a valid number"))
                .transpose()?,
        })
    }
}
