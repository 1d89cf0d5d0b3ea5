//! LLM integration for content-forge.
//!
//! Generation steps depend only on the [`LlmProvider`] trait. Two providers
//! ship with the crate:
//!
//! ```ignore
//! use content_forge::llm::{LiteLlmClient, OfflineProvider, DEFAULT_MODEL};
//!
//! // OpenAI-compatible endpoint (OpenRouter by default)
//! let client = LiteLlmClient::from_env(DEFAULT_MODEL)?;
//!
//! // No network: every step falls back to its template content
//! let offline = OfflineProvider;
//! ```

pub mod litellm;

pub use litellm::{
    Choice, GenerationRequest, GenerationResponse, LiteLlmClient, LlmProvider, Message,
    OfflineProvider, Role, Usage, DEFAULT_MODEL, OPENROUTER_API_BASE,
};
