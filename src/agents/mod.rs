//! Generation steps and the pieces they share.
//!
//! Four steps call the text-generation collaborator (questions, answers,
//! comparison, product content). Each implements [`GenerationStep`] and is
//! driven by [`StepRunner`], which applies the retry policy, the step's
//! validator and, when either fails, the step's deterministic fallback.

pub mod answers;
pub mod blocks;
pub mod comparison;
pub mod data_parser;
pub mod error;
pub mod formatter;
pub mod logger;
pub mod product_content;
pub mod questions;
pub mod retry;
pub mod step;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use answers::{AnswerGeneratorAgent, AnswerInput};
pub use comparison::ComparisonAgent;
pub use data_parser::{DataParserAgent, REQUIRED_FIELDS};
pub use error::{AgentError, AgentResult};
pub use formatter::{format_pages, PageInputs};
pub use logger::{LogLevel, LogRecord, MemoryLogger, StepLogger, TracingLogger};
pub use product_content::ProductContentAgent;
pub use questions::QuestionGeneratorAgent;
pub use retry::{Attempted, RetryPolicy};
pub use step::{GenerationSettings, GenerationStep, QualityIssue, StepRunner};
pub use types::{AgentOutput, GenerationMethod, StepMetadata};
