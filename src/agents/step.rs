//! Generic generation step and the runner that drives it.
//!
//! Each of the four content steps implements [`GenerationStep`]: it builds one
//! batched request, parses the reply, checks it against a quality contract and
//! can produce deterministic content on its own. [`StepRunner`] wires those
//! together: call under the retry policy, then parse, then validate, and fall
//! back on any failure along the way.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::LlmError;
use crate::llm::{GenerationRequest, LlmProvider, Message};
use crate::utils::extract_json_payload;

use super::error::{AgentError, AgentResult};
use super::logger::StepLogger;
use super::retry::RetryPolicy;
use super::types::{AgentOutput, GenerationMethod, StepMetadata};

/// Reason a generated output was rejected by a validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityIssue(pub String);

impl QualityIssue {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl std::fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Model parameters shared by the generation steps.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: crate::llm::DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 4000,
        }
    }
}

impl GenerationSettings {
    /// One system message plus one user message.
    pub fn request(&self, system: &str, user: String) -> GenerationRequest {
        GenerationRequest::new(
            self.model.clone(),
            vec![Message::system(system), Message::user(user)],
        )
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens)
    }
}

/// One text-generation round trip with its validator and fallback.
pub trait GenerationStep: Send + Sync {
    type Input: Sync;
    type Output: Send;

    /// Identifier recorded in metadata and log lines.
    const AGENT_ID: &'static str;

    /// Builds the single batched request for this step.
    fn build_request(&self, input: &Self::Input) -> GenerationRequest;

    /// Checks the reply's shape and converts it to the output type.
    fn parse_response(&self, content: &str, input: &Self::Input) -> AgentResult<Self::Output>;

    /// Quality contract applied to parsed output.
    fn validate(&self, output: &Self::Output, input: &Self::Input) -> Result<(), QualityIssue>;

    /// Deterministic content built from the input alone.
    fn fallback(&self, input: &Self::Input) -> AgentResult<Self::Output>;

    /// Number of items in an output, for metadata.
    fn item_count(output: &Self::Output) -> usize;

    /// Calls avoided by batching this step's items into one request.
    fn calls_saved(&self, _input: &Self::Input) -> usize {
        0
    }
}

/// Deserializes the JSON payload found in a model reply.
pub fn parse_json_payload<T: DeserializeOwned>(content: &str) -> AgentResult<T> {
    let json = extract_json_payload(content)?;
    serde_json::from_str(&json)
        .map_err(|e| AgentError::ResponseParseError(format!("Invalid JSON: {}", e)))
}

/// Runs generation steps against one provider.
pub struct StepRunner {
    llm: Arc<dyn LlmProvider>,
    retry: RetryPolicy,
    logger: Arc<dyn StepLogger>,
}

impl std::fmt::Debug for StepRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRunner")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl StepRunner {
    pub fn new(llm: Arc<dyn LlmProvider>, retry: RetryPolicy, logger: Arc<dyn StepLogger>) -> Self {
        Self { llm, retry, logger }
    }

    /// Runs `step` once. Returns a failed output only when the fallback
    /// itself fails.
    pub async fn run<S: GenerationStep>(&self, step: &S, input: &S::Input) -> AgentOutput<S::Output> {
        let agent = S::AGENT_ID;
        let request = step.build_request(input);

        let outcome = self
            .retry
            .run_if(self.logger.as_ref(), agent, LlmError::is_transient, || {
                self.llm.generate(request.clone())
            })
            .await;

        let mut metadata = StepMetadata::new(agent, GenerationMethod::Llm);
        metadata.attempts = outcome.attempts;
        metadata.api_calls_saved = step.calls_saved(input);

        let reason = match outcome.result {
            Ok(response) => {
                metadata.api_calls = 1;
                let parsed = response
                    .first_content()
                    .filter(|content| !content.trim().is_empty())
                    .ok_or_else(|| AgentError::ResponseParseError("Empty LLM response".to_string()))
                    .and_then(|content| step.parse_response(content, input));

                match parsed {
                    Ok(output) => match step.validate(&output, input) {
                        Ok(()) => {
                            metadata.validation_passed = Some(true);
                            metadata.items = S::item_count(&output);
                            self.logger.info(
                                agent,
                                &format!("generated {} item(s) with LLM", metadata.items),
                            );
                            return AgentOutput::success(output, metadata);
                        }
                        Err(issue) => {
                            metadata.validation_passed = Some(false);
                            AgentError::QualityCheckFailed(issue.0).to_string()
                        }
                    },
                    Err(e) => e.to_string(),
                }
            }
            Err(e) => AgentError::from(e).to_string(),
        };

        self.logger
            .warn(agent, &format!("using template fallback: {}", reason));
        metadata.method = GenerationMethod::Fallback;
        metadata.fallback_used = true;
        metadata.notes.push(reason);

        let fallback = step.fallback(input).and_then(|output| {
            step.validate(&output, input)
                .map(|()| output)
                .map_err(|issue| AgentError::FallbackFailed {
                    step: agent.to_string(),
                    reason: issue.0,
                })
        });

        match fallback {
            Ok(output) => {
                metadata.items = S::item_count(&output);
                self.logger.info(
                    agent,
                    &format!("generated {} item(s) from templates", metadata.items),
                );
                AgentOutput::success(output, metadata)
            }
            Err(e) => {
                self.logger.error(agent, &format!("fallback failed: {}", e));
                AgentOutput::failure(vec![e.to_string()], metadata)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::logger::LogLevel;
    use crate::agents::test_support::{fast_runner, MockLlmProvider};

    /// Echo step: output is the parsed list of words, valid when it has at
    /// least `min` entries.
    struct WordsStep {
        min: usize,
        fallback_ok: bool,
    }

    impl GenerationStep for WordsStep {
        type Input = String;
        type Output = Vec<String>;

        const AGENT_ID: &'static str = "words";

        fn build_request(&self, input: &String) -> GenerationRequest {
            GenerationSettings::default().request("system", format!("List words about {}", input))
        }

        fn parse_response(&self, content: &str, _input: &String) -> AgentResult<Vec<String>> {
            parse_json_payload(content)
        }

        fn validate(&self, output: &Vec<String>, _input: &String) -> Result<(), QualityIssue> {
            if output.len() >= self.min {
                Ok(())
            } else {
                Err(QualityIssue::new(format!("only {} words", output.len())))
            }
        }

        fn fallback(&self, input: &String) -> AgentResult<Vec<String>> {
            if self.fallback_ok {
                Ok(vec![input.clone(); self.min])
            } else {
                Err(AgentError::IncompleteProduct("benefits".to_string()))
            }
        }

        fn item_count(output: &Vec<String>) -> usize {
            output.len()
        }

        fn calls_saved(&self, _input: &String) -> usize {
            self.min - 1
        }
    }

    #[tokio::test]
    async fn test_llm_output_accepted() {
        let mock = Arc::new(MockLlmProvider::with_responses(vec![Ok(
            r#"["glow", "boost", "serum"]"#.to_string(),
        )]));
        let (runner, _) = fast_runner(mock.clone());
        let step = WordsStep { min: 3, fallback_ok: true };

        let output = runner.run(&step, &"skin".to_string()).await;
        assert!(output.success);
        assert_eq!(output.metadata.method, GenerationMethod::Llm);
        assert_eq!(output.metadata.api_calls, 1);
        assert_eq!(output.metadata.api_calls_saved, 2);
        assert_eq!(output.metadata.validation_passed, Some(true));
        assert_eq!(output.data.unwrap()[0], "glow");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_retried_then_accepted() {
        let mock = Arc::new(MockLlmProvider::with_responses(vec![
            Err(LlmError::RateLimited("slow down".to_string())),
            Ok(r#"["a", "b", "c"]"#.to_string()),
        ]));
        let (runner, _) = fast_runner(mock.clone());
        let output = runner
            .run(&WordsStep { min: 3, fallback_ok: true }, &"x".to_string())
            .await;

        assert!(!output.used_fallback());
        assert_eq!(output.metadata.attempts, 2);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_rejected_output_falls_back() {
        let mock = Arc::new(MockLlmProvider::with_responses(vec![Ok(r#"["one"]"#.to_string())]));
        let (runner, logger) = fast_runner(mock.clone());
        let output = runner
            .run(&WordsStep { min: 3, fallback_ok: true }, &"x".to_string())
            .await;

        assert!(output.success);
        assert!(output.used_fallback());
        assert_eq!(output.metadata.method, GenerationMethod::Fallback);
        assert_eq!(output.metadata.validation_passed, Some(false));
        assert!(output.metadata.notes[0].contains("only 1 words"));
        assert_eq!(output.data.unwrap(), vec!["x", "x", "x"]);
        assert_eq!(mock.call_count(), 1);
        assert!(logger.contains(LogLevel::Warn, "using template fallback"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_not_retried() {
        let mock = Arc::new(MockLlmProvider::with_responses(vec![Ok(
            "I'd rather not.".to_string(),
        )]));
        let (runner, _) = fast_runner(mock.clone());
        let output = runner
            .run(&WordsStep { min: 1, fallback_ok: true }, &"x".to_string())
            .await;

        assert!(output.used_fallback());
        assert_eq!(output.metadata.validation_passed, None);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let mock = Arc::new(MockLlmProvider::failing());
        let (runner, _) = fast_runner(mock.clone());
        let output = runner
            .run(&WordsStep { min: 2, fallback_ok: true }, &"x".to_string())
            .await;

        assert!(output.success);
        assert!(output.used_fallback());
        assert_eq!(output.metadata.api_calls, 0);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fallback_failure_reported() {
        let (runner, logger) = fast_runner(Arc::new(MockLlmProvider::failing()));
        let output = runner
            .run(&WordsStep { min: 2, fallback_ok: false }, &"x".to_string())
            .await;

        assert!(!output.success);
        assert!(output.data.is_none());
        assert!(output.errors[0].contains("incomplete"));
        assert!(logger.contains(LogLevel::Error, "fallback failed"));
    }
}
