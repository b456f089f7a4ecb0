use anyhow::{bail, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_THREAD_TITLE: &str = "New Chat";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    pub default_thread_title: String,
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            default_thread_title: DEFAULT_THREAD_TITLE.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let api_url = std::env::var("CLINCHAT_API_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let default_thread_title = std::env::var("CLINCHAT_DEFAULT_TITLE")
            .unwrap_or_else(|_| DEFAULT_THREAD_TITLE.to_string());
        let connect_timeout_secs = std::env::var("CLINCHAT_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|v| v.clamp(1, 120))
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);

        Ok(Self {
            api_url,
            default_thread_title,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }

    pub fn validate(&self) -> Result<()> {
        let parsed = match Url::parse(&self.api_url) {
            Ok(parsed) => parsed,
            Err(error) => bail!("Invalid CLINCHAT_API_URL '{}': {}", self.api_url, error),
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "Invalid CLINCHAT_API_URL '{}': expected http:// or https:// URL",
                self.api_url
            );
        }

        if self.default_thread_title.trim().is_empty() {
            bail!("CLINCHAT_DEFAULT_TITLE must not be blank");
        }

        Ok(())
    }
}
