//! Error types for the generation steps and the pipeline around them.
//!
//! Collaborator failures and quality failures inside a generation step are
//! recovered by that step's fallback. Everything else in this enum halts the
//! run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Raw input lacks one or more required keys.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// A required key is present but has the wrong type or is blank.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// Raw input is not a flat mapping.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Product has empty list fields after normalization.
    #[error("Product is incomplete, empty fields: {0}")]
    IncompleteProduct(String),

    /// Error from the LLM provider.
    #[error("LLM error: {0}")]
    LlmError(String),

    /// Error parsing LLM response.
    #[error("Failed to parse LLM response: {0}")]
    ResponseParseError(String),

    /// Generated output did not meet the step's quality contract.
    #[error("Quality check failed: {0}")]
    QualityCheckFailed(String),

    /// The deterministic fallback could not produce content.
    #[error("Fallback for '{step}' failed: {reason}")]
    FallbackFailed { step: String, reason: String },

    /// A formatting stage received data it cannot assemble.
    #[error("Formatting failed: {0}")]
    Formatting(String),

    /// Reading or writing an output file failed.
    #[error("Output file {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<crate::error::LlmError> for AgentError {
    fn from(err: crate::error::LlmError) -> Self {
        AgentError::LlmError(err.to_string())
    }
}

impl From<crate::utils::JsonExtractionError> for AgentError {
    fn from(err: crate::utils::JsonExtractionError) -> Self {
        AgentError::ResponseParseError(err.to_string())
    }
}

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
