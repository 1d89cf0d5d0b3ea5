//! content-forge: product content pages from a multi-step LLM pipeline.
//!
//! A flat product description goes through four generation steps
//! (questions, answers, competitor comparison, product copy). Each step makes
//! one batched LLM call, validates the reply, and falls back to
//! deterministic templates when the call fails or the reply is rejected. The
//! results are assembled into FAQ, product and comparison pages and written
//! as JSON files.

pub mod agents;
pub mod cli;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use agents::{AgentError, AgentResult};
pub use error::LlmError;
pub use pipeline::{ContentOrchestrator, PipelineConfig, WorkflowSummary};
