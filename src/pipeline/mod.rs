//! Pipeline orchestration for product content generation.
//!
//! # Architecture
//!
//! - **Orchestrator**: walks one run through its stages and summarizes it
//! - **State**: the stage machine and the per-run record it fills in
//! - **Persistence**: writes the finished pages as flat JSON files
//! - **Config**: model, retry and output settings
//!
//! # Pipeline Flow
//!
//! 1. **Parsing**: the raw mapping becomes a [`Product`](crate::models::Product)
//! 2. **Questions**: one batched call, or the template catalog
//! 3. **Answers**: one batched call for every question, or keyword templates
//! 4. **Comparison**: a fictional competitor and at least five points
//! 5. **Product content**: tagline, description, features and precautions
//! 6. **Formatting**: FAQ, product and comparison pages
//! 7. **Saving**: one file per page
//!
//! A failing stage moves the run to `failed` and nothing after it runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use content_forge::llm::LiteLlmClient;
//! use content_forge::pipeline::{ContentOrchestrator, PipelineConfig};
//!
//! let config = PipelineConfig::from_env()?.with_output_dir("site/data");
//! let client = Arc::new(LiteLlmClient::from_env(config.model.clone())?);
//! let orchestrator = ContentOrchestrator::new(client, config);
//!
//! let summary = orchestrator.run(&raw_product).await;
//! println!("{}: {} file(s)", summary.status, summary.files.len());
//! ```

pub mod config;
pub mod orchestrator;
pub mod persistence;
pub mod state;

pub use config::{ConfigError, PipelineConfig};
pub use orchestrator::{ContentOrchestrator, WorkflowSummary};
pub use persistence::{content_digest, PageStore, WrittenPage};
pub use state::{WorkflowStage, WorkflowState};
