//! Error types for the text-generation collaborator.
//!
//! Step, formatting and persistence failures live in
//! [`crate::agents::AgentError`]; configuration failures in
//! [`crate::pipeline::ConfigError`].

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: CONTENT_FORGE_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("LLM response contained no content")]
    EmptyResponse,

    #[error("Text generation is disabled (offline mode)")]
    Disabled,
}

impl LlmError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RequestFailed(_) | LlmError::RateLimited(_) | LlmError::EmptyResponse => {
                true
            }
            LlmError::ApiError { code, .. } => *code >= 500 || *code == 408,
            LlmError::MissingApiKey
            | LlmError::ParseError(_)
            | LlmError::Disabled => false,
        }
    }
}
