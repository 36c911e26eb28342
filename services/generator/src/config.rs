//! services/generator/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use study_assistant_core::retry::RetryPolicy;
use tracing::Level;

use crate::adapters::gemini::{GeminiSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: Level,
    pub gemini_api_key: Option<String>,
    pub gemini: GeminiSettings,
    pub retry: RetryPolicy,
    pub results_dir: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Backend Settings ---
        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());
        let model = lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = lookup("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs: u64 = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let max_output_tokens: u32 = parse_var(&lookup, "MAX_OUTPUT_TOKENS", 8192)?;
        let temperature: f32 = parse_var(&lookup, "TEMPERATURE", 0.7)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue(
                "TEMPERATURE".to_string(),
                format!("{} is outside 0.0..=2.0", temperature),
            ));
        }

        // --- Retry Settings ---
        let max_retries: u32 = parse_var(&lookup, "RETRY_MAX_ATTEMPTS", 3)?;
        let network_delay: u64 = parse_var(&lookup, "RETRY_NETWORK_DELAY_SECS", 2)?;
        let rate_limit_delay: u64 = parse_var(&lookup, "RETRY_RATE_LIMIT_DELAY_SECS", 60)?;

        let results_dir = lookup("RESULTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./results"));

        Ok(Self {
            log_level,
            gemini_api_key,
            gemini: GeminiSettings {
                base_url,
                model,
                timeout: Duration::from_secs(timeout_secs),
                max_output_tokens,
                temperature,
            },
            retry: RetryPolicy::new()
                .with_max_retries(max_retries)
                .with_network_delay(Duration::from_secs(network_delay))
                .with_default_rate_limit_delay(Duration::from_secs(rate_limit_delay)),
            results_dir,
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}
