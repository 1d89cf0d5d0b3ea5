//! Shared fixtures for agent unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::{Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage};
use crate::models::Product;

use super::logger::MemoryLogger;
use super::retry::RetryPolicy;
use super::step::StepRunner;

/// Provider that replays scripted replies, then fails with a transient
/// error once the script runs out.
pub struct MockLlmProvider {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockLlmProvider {
    pub fn with_responses(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::with_responses(Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("lock not poisoned").clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(prompt) = request.user_prompt() {
            self.prompts
                .lock()
                .expect("lock not poisoned")
                .push(prompt.to_string());
        }
        let next = self
            .responses
            .lock()
            .expect("lock not poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::RequestFailed("connection refused".to_string())));
        let content = next?;
        Ok(GenerationResponse {
            id: "mock-id".to_string(),
            model: "mock-model".to_string(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(content),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        })
    }
}

/// Runner with millisecond backoff and a capturing logger.
pub fn fast_runner(llm: Arc<dyn LlmProvider>) -> (StepRunner, Arc<MemoryLogger>) {
    let logger = Arc::new(MemoryLogger::new());
    let retry = RetryPolicy::new(3, Duration::from_millis(1), 2.0, Duration::from_millis(4));
    (StepRunner::new(llm, retry, logger.clone()), logger)
}

pub fn glowboost() -> Product {
    Product::new(
        "GlowBoost Vitamin C Serum",
        "10% Vitamin C",
        "Oily, Combination",
        "Vitamin C, Hyaluronic Acid",
        "Brightening, Fades dark spots",
        "Apply 2–3 drops in the morning before sunscreen",
        Some("Mild tingling for sensitive skin".to_string()),
        "₹699",
    )
}
