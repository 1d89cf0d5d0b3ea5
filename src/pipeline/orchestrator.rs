//! Sequential orchestrator for one content run.
//!
//! The orchestrator owns a [`WorkflowState`] for the duration of a run and
//! walks it through the stages in order:
//!
//! - parse the raw product mapping
//! - generate questions, answers, the comparison and the product copy
//! - format the three pages
//! - write them to the output directory
//!
//! Every generation step either returns accepted model output or its
//! deterministic fallback. The run halts only when parsing fails, a fallback
//! fails, formatting fails, or a page cannot be written. Nothing is written
//! unless every earlier stage succeeded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::agents::{
    format_pages, AgentOutput, AnswerGeneratorAgent, AnswerInput, ComparisonAgent,
    DataParserAgent, GenerationMethod, PageInputs, ProductContentAgent, QuestionGeneratorAgent,
    StepLogger, StepMetadata, StepRunner, TracingLogger,
};
use crate::llm::{LlmProvider, OfflineProvider};
use crate::models::PageKind;

use super::config::PipelineConfig;
use super::persistence::{PageStore, WrittenPage};
use super::state::{WorkflowStage, WorkflowState};

const ORCHESTRATOR: &str = "orchestrator";
const FORMATTER: &str = "formatter";

/// Outcome of one run, suitable for printing or serializing.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSummary {
    pub run_id: Uuid,
    pub status: WorkflowStage,
    pub failed_stage: Option<WorkflowStage>,
    pub product_name: Option<String>,
    pub questions_generated: usize,
    pub answers_generated: usize,
    pub comparison_points: usize,
    pub competitor: Option<String>,
    pub pages_generated: Vec<PageKind>,
    pub files: Vec<WrittenPage>,
    pub steps: Vec<StepMetadata>,
    pub fallbacks_used: usize,
    pub api_calls_made: u32,
    pub api_calls_saved: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub errors: Vec<String>,
}

impl WorkflowSummary {
    pub fn from_state(
        state: &WorkflowState,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id: state.run_id,
            status: state.stage,
            failed_stage: state.failed_stage,
            product_name: state.product.as_ref().map(|p| p.name.clone()),
            questions_generated: state.questions.as_ref().map_or(0, |q| q.len()),
            answers_generated: state.answers.as_ref().map_or(0, Vec::len),
            comparison_points: state
                .comparison
                .as_ref()
                .map_or(0, |c| c.comparison_points.len()),
            competitor: state
                .comparison
                .as_ref()
                .map(|c| c.competitor_name().to_string())
                .filter(|name| !name.is_empty()),
            pages_generated: state.pages.iter().map(|p| p.kind()).collect(),
            files: state.written.clone(),
            steps: state.steps.clone(),
            fallbacks_used: state.fallback_count(),
            api_calls_made: state.api_calls_made(),
            api_calls_saved: state.api_calls_saved(),
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
            errors: state.errors.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == WorkflowStage::Completed
    }

    /// Generation method of a step, when it ran.
    pub fn method_of(&self, agent_id: &str) -> Option<GenerationMethod> {
        self.steps
            .iter()
            .find(|s| s.agent_id == agent_id)
            .map(|s| s.method)
    }
}

/// Drives the content steps for one product at a time.
pub struct ContentOrchestrator {
    config: PipelineConfig,
    runner: StepRunner,
    logger: Arc<dyn StepLogger>,
    store: PageStore,
    parser: DataParserAgent,
    questions: QuestionGeneratorAgent,
    answers: AnswerGeneratorAgent,
    comparison: ComparisonAgent,
    content: ProductContentAgent,
}

impl std::fmt::Debug for ContentOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentOrchestrator")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ContentOrchestrator {
    /// Creates an orchestrator that logs through `tracing`.
    pub fn new(llm: Arc<dyn LlmProvider>, config: PipelineConfig) -> Self {
        Self::with_logger(llm, config, TracingLogger::shared())
    }

    /// Creates an orchestrator with an explicit logging capability.
    ///
    /// With `config.offline` set, `llm` is replaced by [`OfflineProvider`].
    pub fn with_logger(
        llm: Arc<dyn LlmProvider>,
        config: PipelineConfig,
        logger: Arc<dyn StepLogger>,
    ) -> Self {
        let llm: Arc<dyn LlmProvider> = if config.offline {
            Arc::new(OfflineProvider)
        } else {
            llm
        };
        let settings = config.generation_settings();

        Self {
            runner: StepRunner::new(llm, config.retry_policy(), logger.clone()),
            store: PageStore::new(config.output_dir.clone()),
            parser: DataParserAgent::new(),
            questions: QuestionGeneratorAgent::new(settings.clone()),
            answers: AnswerGeneratorAgent::new(settings.clone()),
            comparison: ComparisonAgent::new(settings.clone()),
            content: ProductContentAgent::new(settings),
            logger,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the pipeline and summarizes the outcome.
    pub async fn run(&self, raw: &Value) -> WorkflowSummary {
        let started_at = Utc::now();
        let state = self.run_state(raw).await;
        let summary = WorkflowSummary::from_state(&state, started_at, Utc::now());

        if summary.is_success() {
            self.logger.info(
                ORCHESTRATOR,
                &format!(
                    "run {} completed: {} page(s), {} fallback(s), {} API call(s), {} saved",
                    summary.run_id,
                    summary.files.len(),
                    summary.fallbacks_used,
                    summary.api_calls_made,
                    summary.api_calls_saved
                ),
            );
        } else {
            self.logger.error(
                ORCHESTRATOR,
                &format!(
                    "run {} failed at {}: {}",
                    summary.run_id,
                    summary
                        .failed_stage
                        .map_or("unknown", |stage| stage.as_str()),
                    summary.errors.join("; ")
                ),
            );
        }

        summary
    }

    /// Runs the pipeline and returns the final state.
    pub async fn run_state(&self, raw: &Value) -> WorkflowState {
        let mut state = WorkflowState::new();
        self.logger.info(
            ORCHESTRATOR,
            &format!("starting run {} -> {}", state.run_id, self.store.base_path().display()),
        );

        self.enter(&state);
        let Some(product) = self.settle(&mut state, self.parser.run(raw)) else {
            return state;
        };
        state.product = Some(product.clone());
        state.advance();

        self.enter(&state);
        let output = self.runner.run(&self.questions, &product).await;
        let Some(questions) = self.settle(&mut state, output) else {
            return state;
        };
        state.questions = Some(questions.clone());
        state.advance();

        self.enter(&state);
        let input = AnswerInput {
            product: product.clone(),
            questions: questions.clone(),
        };
        let output = self.runner.run(&self.answers, &input).await;
        let Some(answers) = self.settle(&mut state, output) else {
            return state;
        };
        state.answers = Some(answers.clone());
        state.advance();

        self.enter(&state);
        let output = self.runner.run(&self.comparison, &product).await;
        let Some(comparison) = self.settle(&mut state, output) else {
            return state;
        };
        state.comparison = Some(comparison.clone());
        state.advance();

        self.enter(&state);
        let output = self.runner.run(&self.content, &product).await;
        let Some(content) = self.settle(&mut state, output) else {
            return state;
        };
        state.content = Some(content.clone());
        state.advance();

        self.enter(&state);
        let formatted = format_pages(PageInputs {
            product: &product,
            questions: &questions,
            answers: &answers,
            comparison: &comparison,
            content: &content,
        });
        match formatted {
            Ok(pages) => {
                state.record_step(
                    StepMetadata::new(FORMATTER, GenerationMethod::Deterministic)
                        .with_items(pages.len()),
                );
                state.pages = pages;
                state.advance();
            }
            Err(e) => {
                state.record_step(StepMetadata::new(FORMATTER, GenerationMethod::Deterministic));
                self.abort(&mut state, vec![e.to_string()]);
                return state;
            }
        }

        self.enter(&state);
        // Pages already on disk stay there if a later write fails.
        let pages = state.pages.clone();
        for page in &pages {
            match self.store.save(page).await {
                Ok(written) => {
                    self.logger.debug(
                        ORCHESTRATOR,
                        &format!("wrote {} ({} bytes)", written.path.display(), written.bytes),
                    );
                    state.written.push(written);
                }
                Err(e) => {
                    self.abort(&mut state, vec![e.to_string()]);
                    return state;
                }
            }
        }
        state.advance();

        state
    }

    fn enter(&self, state: &WorkflowState) {
        self.logger
            .debug(ORCHESTRATOR, &format!("stage: {}", state.stage));
    }

    /// Records a step's metadata and unwraps its payload, failing the run
    /// when the step produced none.
    fn settle<T>(&self, state: &mut WorkflowState, output: AgentOutput<T>) -> Option<T> {
        let metadata = output.metadata.clone();
        state.record_step(metadata);
        match output.into_result() {
            Ok((data, _)) => Some(data),
            Err(errors) => {
                self.abort(state, errors);
                None
            }
        }
    }

    fn abort(&self, state: &mut WorkflowState, errors: Vec<String>) {
        self.logger.error(
            ORCHESTRATOR,
            &format!("{} failed: {}", state.stage, errors.join("; ")),
        );
        state.fail(errors);
    }
}
