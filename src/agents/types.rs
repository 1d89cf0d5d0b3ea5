//! Core types shared by the generation steps.
//!
//! Every step returns an [`AgentOutput`]: a success flag, the payload, the
//! [`StepMetadata`] describing how it was produced, and any error messages.

use serde::{Deserialize, Serialize};

/// How a step's payload was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationMethod {
    /// Accepted output of a text-generation call.
    #[serde(rename = "LLM")]
    Llm,
    /// Deterministic template content after a failed or rejected call.
    #[serde(rename = "Fallback (Template-based)")]
    Fallback,
    /// Pure transformation with no generation call (parsing, formatting).
    #[serde(rename = "Deterministic")]
    Deterministic,
}

impl GenerationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMethod::Llm => "LLM",
            GenerationMethod::Fallback => "Fallback (Template-based)",
            GenerationMethod::Deterministic => "Deterministic",
        }
    }
}

impl std::fmt::Display for GenerationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance and accounting for one step invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMetadata {
    /// Identifier of the step that produced the payload.
    pub agent_id: String,
    pub method: GenerationMethod,
    pub fallback_used: bool,
    /// Generation calls that completed a round trip (0 or 1).
    pub api_calls: u32,
    /// Attempts consumed by the retry wrapper.
    pub attempts: u32,
    /// Number of items produced (questions, answers, points, ...).
    pub items: usize,
    /// Calls avoided by batching, for steps that produce many items at once.
    pub api_calls_saved: usize,
    /// Whether the generated output passed its validator. `None` when no
    /// generated output was validated.
    pub validation_passed: Option<bool>,
    /// Free-form diagnostics, e.g. why a fallback was taken.
    pub notes: Vec<String>,
}

impl StepMetadata {
    pub fn new(agent_id: impl Into<String>, method: GenerationMethod) -> Self {
        Self {
            agent_id: agent_id.into(),
            method,
            fallback_used: method == GenerationMethod::Fallback,
            api_calls: 0,
            attempts: 0,
            items: 0,
            api_calls_saved: 0,
            validation_passed: None,
            notes: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: usize) -> Self {
        self.items = items;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Uniform result wrapper returned by every step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput<T> {
    pub success: bool,
    pub data: Option<T>,
    pub metadata: StepMetadata,
    pub errors: Vec<String>,
}

impl<T> AgentOutput<T> {
    pub fn success(data: T, metadata: StepMetadata) -> Self {
        Self {
            success: true,
            data: Some(data),
            metadata,
            errors: Vec::new(),
        }
    }

    pub fn failure(errors: Vec<String>, metadata: StepMetadata) -> Self {
        Self {
            success: false,
            data: None,
            metadata,
            errors,
        }
    }

    pub fn used_fallback(&self) -> bool {
        self.metadata.fallback_used
    }

    /// Splits into the payload, or the error list when the step failed.
    pub fn into_result(self) -> Result<(T, StepMetadata), Vec<String>> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok((data, self.metadata)),
            (_, _) if self.errors.is_empty() => Err(vec![format!(
                "step '{}' produced no data",
                self.metadata.agent_id
            )]),
            _ => Err(self.errors),
        }
    }
}
