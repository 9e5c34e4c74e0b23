use serde::Deserialize;
use std::fs;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonConfig {
    pub term_1: String,
    pub term_2: String,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
    pub comparisons: Vec<ComparisonConfig>,
    #[serde(default)]
    pub refresh_interval_seconds: Option<u64>,
}

fn default_timeout() -> u64 {
    10
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;

    if config.api_base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api_base_url is empty".into()));
    }
    if config.comparisons.is_empty() {
        return Err(ConfigError::Invalid("no comparisons configured".into()));
    }
    if config.request_timeout_seconds == 0 {
        return Err(ConfigError::Invalid("request_timeout_seconds must be positive".into()));
    }
    Ok(config)
}
