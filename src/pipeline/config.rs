//! Pipeline configuration for the orchestrator.
//!
//! Covers the model parameters shared by the generation steps, the retry
//! schedule wrapped around each generation call, the output directory, and
//! offline mode.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::agents::retry::{
    RetryPolicy, DEFAULT_BACKOFF_BASE, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY,
    DEFAULT_MAX_RETRIES,
};
use crate::agents::step::GenerationSettings;
use crate::llm::DEFAULT_MODEL;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for the content pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    // LLM settings
    /// Model used by every generation step.
    pub model: String,
    /// Temperature for LLM generation.
    pub temperature: f64,
    /// Maximum tokens per generation reply.
    pub max_tokens: u32,

    // Retry settings
    /// Total attempts per generation call.
    pub max_retries: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Factor applied to the delay after each failed attempt.
    pub backoff_base: f64,
    /// Upper bound on any single delay.
    pub max_delay: Duration,

    // Output settings
    /// Directory the page files are written to.
    pub output_dir: PathBuf,

    /// Skip the text-generation collaborator entirely.
    pub offline: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 4000,

            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            backoff_base: DEFAULT_BACKOFF_BASE,
            max_delay: DEFAULT_MAX_DELAY,

            output_dir: PathBuf::from("output"),
            offline: false,
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CONTENT_FORGE_MODEL`: Model id (default: meta-llama/llama-3.1-8b-instruct)
    /// - `CONTENT_FORGE_TEMPERATURE`: LLM temperature (default: 0.7)
    /// - `CONTENT_FORGE_MAX_TOKENS`: Reply token limit (default: 4000)
    /// - `CONTENT_FORGE_OUTPUT_DIR`: Output directory (default: output)
    /// - `CONTENT_FORGE_MAX_RETRIES`: Attempts per generation call (default: 3)
    /// - `CONTENT_FORGE_RETRY_INITIAL_DELAY_MS`: First backoff delay (default: 1000)
    /// - `CONTENT_FORGE_RETRY_BACKOFF_BASE`: Backoff multiplier (default: 2.0)
    /// - `CONTENT_FORGE_RETRY_MAX_DELAY_MS`: Backoff cap (default: 10000)
    /// - `CONTENT_FORGE_OFFLINE`: Use template content only (default: false)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`PipelineConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("CONTENT_FORGE_MODEL") {
            config.model = val;
        }

        if let Some(val) = lookup("CONTENT_FORGE_TEMPERATURE") {
            config.temperature = parse_env_value(&val, "CONTENT_FORGE_TEMPERATURE")?;
        }

        if let Some(val) = lookup("CONTENT_FORGE_MAX_TOKENS") {
            config.max_tokens = parse_env_value(&val, "CONTENT_FORGE_MAX_TOKENS")?;
        }

        if let Some(val) = lookup("CONTENT_FORGE_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(val);
        }

        if let Some(val) = lookup("CONTENT_FORGE_MAX_RETRIES") {
            config.max_retries = parse_env_value(&val, "CONTENT_FORGE_MAX_RETRIES")?;
        }

        if let Some(val) = lookup("CONTENT_FORGE_RETRY_INITIAL_DELAY_MS") {
            let ms: u64 = parse_env_value(&val, "CONTENT_FORGE_RETRY_INITIAL_DELAY_MS")?;
            config.initial_delay = Duration::from_millis(ms);
        }

        if let Some(val) = lookup("CONTENT_FORGE_RETRY_BACKOFF_BASE") {
            config.backoff_base = parse_env_value(&val, "CONTENT_FORGE_RETRY_BACKOFF_BASE")?;
        }

        if let Some(val) = lookup("CONTENT_FORGE_RETRY_MAX_DELAY_MS") {
            let ms: u64 = parse_env_value(&val, "CONTENT_FORGE_RETRY_MAX_DELAY_MS")?;
            config.max_delay = Duration::from_millis(ms);
        }

        if let Some(val) = lookup("CONTENT_FORGE_OFFLINE") {
            config.offline = parse_env_bool(&val, "CONTENT_FORGE_OFFLINE")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "model cannot be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationFailed(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.max_retries == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_retries must be at least 1".to_string(),
            ));
        }

        if !self.backoff_base.is_finite() || self.backoff_base < 1.0 {
            return Err(ConfigError::ValidationFailed(
                "backoff_base must be at least 1.0".to_string(),
            ));
        }

        if self.initial_delay > self.max_delay {
            return Err(ConfigError::ValidationFailed(
                "initial_delay cannot exceed max_delay".to_string(),
            ));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "output_dir cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Retry schedule for generation calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            self.initial_delay,
            self.backoff_base,
            self.max_delay,
        )
    }

    /// Model parameters for the generation steps.
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Builder method to set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder method to set temperature.
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    /// Builder method to set max tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Builder method to set the retry schedule.
    pub fn with_retry(
        mut self,
        max_retries: u32,
        initial_delay: Duration,
        backoff_base: f64,
        max_delay: Duration,
    ) -> Self {
        self.max_retries = max_retries;
        self.initial_delay = initial_delay;
        self.backoff_base = backoff_base;
        self.max_delay = max_delay;
        self
    }

    /// Builder method to set the output directory.
    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    /// Builder method to enable or disable offline mode.
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}
