//! Workflow stages and the per-run state record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::StepMetadata;
use crate::models::{ComparisonData, Page, Product, ProductContent, QuestionSet};

use super::persistence::WrittenPage;

/// Stage of one pipeline run.
///
/// Stages advance strictly in declaration order. `Failed` is reachable from
/// any stage and absorbs every later transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    ParsingData,
    GeneratingQuestions,
    GeneratingAnswers,
    GeneratingComparison,
    GeneratingProductContent,
    FormattingPages,
    SavingOutputs,
    Completed,
    Failed,
}

impl WorkflowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::ParsingData => "parsing_data",
            WorkflowStage::GeneratingQuestions => "generating_questions",
            WorkflowStage::GeneratingAnswers => "generating_answers",
            WorkflowStage::GeneratingComparison => "generating_comparison",
            WorkflowStage::GeneratingProductContent => "generating_product_content",
            WorkflowStage::FormattingPages => "formatting_pages",
            WorkflowStage::SavingOutputs => "saving_outputs",
            WorkflowStage::Completed => "completed",
            WorkflowStage::Failed => "failed",
        }
    }

    /// The stage that follows a successful one. Terminal stages map to
    /// themselves.
    pub fn next(&self) -> WorkflowStage {
        match self {
            WorkflowStage::ParsingData => WorkflowStage::GeneratingQuestions,
            WorkflowStage::GeneratingQuestions => WorkflowStage::GeneratingAnswers,
            WorkflowStage::GeneratingAnswers => WorkflowStage::GeneratingComparison,
            WorkflowStage::GeneratingComparison => WorkflowStage::GeneratingProductContent,
            WorkflowStage::GeneratingProductContent => WorkflowStage::FormattingPages,
            WorkflowStage::FormattingPages => WorkflowStage::SavingOutputs,
            WorkflowStage::SavingOutputs => WorkflowStage::Completed,
            WorkflowStage::Completed => WorkflowStage::Completed,
            WorkflowStage::Failed => WorkflowStage::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStage::Completed | WorkflowStage::Failed)
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one run accumulates. Owned by the orchestrator for the
/// duration of a single invocation.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub run_id: Uuid,
    pub stage: WorkflowStage,
    /// Stage that was active when the run failed.
    pub failed_stage: Option<WorkflowStage>,
    pub product: Option<Product>,
    pub questions: Option<QuestionSet>,
    pub answers: Option<Vec<String>>,
    pub comparison: Option<ComparisonData>,
    pub content: Option<ProductContent>,
    pub pages: Vec<Page>,
    pub written: Vec<WrittenPage>,
    /// Metadata of every step that ran, in order.
    pub steps: Vec<StepMetadata>,
    pub errors: Vec<String>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            stage: WorkflowStage::ParsingData,
            failed_stage: None,
            product: None,
            questions: None,
            answers: None,
            comparison: None,
            content: None,
            pages: Vec::new(),
            written: Vec::new(),
            steps: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Moves to the next stage. No effect once the run is terminal.
    pub fn advance(&mut self) {
        self.stage = self.stage.next();
    }

    /// Records the errors and enters `Failed`, remembering where it happened.
    pub fn fail(&mut self, errors: Vec<String>) {
        if self.stage.is_terminal() {
            self.errors.extend(errors);
            return;
        }
        self.failed_stage = Some(self.stage);
        self.stage = WorkflowStage::Failed;
        self.errors.extend(errors);
    }

    pub fn is_completed(&self) -> bool {
        self.stage == WorkflowStage::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.stage == WorkflowStage::Failed
    }

    pub fn record_step(&mut self, metadata: StepMetadata) {
        self.steps.push(metadata);
    }

    pub fn fallback_count(&self) -> usize {
        self.steps.iter().filter(|s| s.fallback_used).count()
    }

    pub fn api_calls_made(&self) -> u32 {
        self.steps.iter().map(|s| s.api_calls).sum()
    }

    pub fn api_calls_saved(&self) -> usize {
        self.steps.iter().map(|s| s.api_calls_saved).sum()
    }
}
