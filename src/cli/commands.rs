//! CLI command definitions for content-forge.
//!
//! `generate` runs the full pipeline for one product and writes the three
//! pages; `sample` prints the built-in product mapping so it can be edited
//! and fed back with `--input`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::LlmError;
use crate::llm::litellm::{API_BASE_ENV, API_KEY_ENV};
use crate::llm::{LiteLlmClient, LlmProvider, OfflineProvider};
use crate::pipeline::{ContentOrchestrator, PipelineConfig, WorkflowSummary};

/// Product content generator: FAQ, product and comparison pages.
#[derive(Parser)]
#[command(name = "content-forge")]
#[command(about = "Generate FAQ, product and comparison pages for a product")]
#[command(version)]
#[command(
    long_about = "content-forge turns a flat product description into three JSON pages.\n\nEach generation step makes one batched LLM call and falls back to deterministic templates when the call fails or its output is rejected.\n\nExample usage:\n  content-forge generate --input product.json --output ./output\n  content-forge generate --offline"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate the pages for one product.
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// Print the built-in sample product.
    Sample(SampleArgs),
}

/// Arguments for the generate command.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Product mapping as JSON or YAML (by extension). Defaults to the
    /// built-in sample product.
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Output directory for the page files.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Model identifier (OpenRouter format).
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// API key (can also be set via CONTENT_FORGE_API_KEY or OPENROUTER_API_KEY).
    #[arg(long, env = "CONTENT_FORGE_API_KEY")]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint.
    #[arg(long, env = "CONTENT_FORGE_API_BASE")]
    pub api_base: Option<String>,

    /// Skip the LLM entirely and use template content for every step.
    #[arg(long)]
    pub offline: bool,

    /// Print the run summary as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for the sample command.
#[derive(Parser, Debug)]
pub struct SampleArgs {
    /// Print YAML instead of JSON.
    #[arg(long)]
    pub yaml: bool,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => run_generate_command(args).await,
        Commands::Sample(args) => run_sample_command(args),
    }
}

/// The product used when no input file is given.
pub fn sample_product() -> Value {
    serde_json::json!({
        "product_name": "GlowBoost Vitamin C Serum",
        "concentration": "10% Vitamin C",
        "skin_type": "Oily, Combination",
        "key_ingredients": "Vitamin C, Hyaluronic Acid",
        "benefits": "Brightening, Fades dark spots",
        "how_to_use": "Apply 2–3 drops in the morning before sunscreen",
        "side_effects": "Mild tingling for sensitive skin",
        "price": "₹699"
    })
}

/// Reads a product mapping; `.yaml`/`.yml` files are parsed as YAML,
/// everything else as JSON.
pub fn load_product_file(path: &Path) -> anyhow::Result<Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    let value: Value = if is_yaml {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?
    };
    Ok(value)
}

fn build_llm_client(
    args: &GenerateArgs,
    config: &PipelineConfig,
) -> anyhow::Result<Arc<dyn LlmProvider>> {
    if config.offline {
        info!("Offline mode: every step uses template content");
        return Ok(Arc::new(OfflineProvider));
    }

    // Flags win over the environment; clap already folds the
    // CONTENT_FORGE_* variables into them.
    let lookup = |key: &str| {
        match key {
            API_KEY_ENV => args.api_key.clone(),
            API_BASE_ENV => args.api_base.clone(),
            _ => None,
        }
        .or_else(|| std::env::var(key).ok())
    };

    match LiteLlmClient::from_lookup(lookup, config.model.clone()) {
        Ok(client) => {
            info!(
                model = %config.model,
                api_base = %client.api_base(),
                "Using OpenAI-compatible endpoint"
            );
            Ok(Arc::new(client))
        }
        Err(LlmError::MissingApiKey) => {
            warn!("No API key configured; running offline with template content");
            Ok(Arc::new(OfflineProvider))
        }
        Err(e) => Err(anyhow::anyhow!("Failed to initialize LLM client: {}", e)),
    }
}

async fn run_generate_command(args: GenerateArgs) -> anyhow::Result<()> {
    let mut config = PipelineConfig::from_env().context("Invalid configuration")?;
    if let Some(output) = &args.output {
        config = config.with_output_dir(output.clone());
    }
    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }
    if args.offline {
        config = config.with_offline(true);
    }
    config.validate().context("Invalid configuration")?;

    let raw = match &args.input {
        Some(path) => load_product_file(path)?,
        None => {
            info!("No --input given, using the built-in sample product");
            sample_product()
        }
    };

    let llm = build_llm_client(&args, &config)?;
    let orchestrator = ContentOrchestrator::new(llm, config);
    let summary = orchestrator.run(&raw).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if !summary.is_success() {
        anyhow::bail!(
            "run failed at {}: {}",
            summary
                .failed_stage
                .map_or("unknown", |stage| stage.as_str()),
            summary.errors.join("; ")
        );
    }
    Ok(())
}

fn run_sample_command(args: SampleArgs) -> anyhow::Result<()> {
    let sample = sample_product();
    if args.yaml {
        print!("{}", serde_yaml::to_string(&sample)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&sample)?);
    }
    Ok(())
}

fn print_summary(summary: &WorkflowSummary) {
    println!();
    println!("Run {} ({})", summary.run_id, summary.status);
    if let Some(name) = &summary.product_name {
        println!("  Product:            {}", name);
    }
    println!("  Questions:          {}", summary.questions_generated);
    println!("  Answers:            {}", summary.answers_generated);
    println!("  Comparison points:  {}", summary.comparison_points);
    if let Some(competitor) = &summary.competitor {
        println!("  Competitor:         {}", competitor);
    }
    println!(
        "  API calls:          {} made, {} saved by batching",
        summary.api_calls_made, summary.api_calls_saved
    );
    println!("  Fallbacks used:     {}", summary.fallbacks_used);
    println!("  Duration:           {} ms", summary.duration_ms);

    if !summary.steps.is_empty() {
        println!("  Steps:");
        for step in &summary.steps {
            println!("    {:<20} {}", step.agent_id, step.method);
        }
    }

    if !summary.files.is_empty() {
        println!("  Files:");
        for file in &summary.files {
            println!("    {} ({} bytes)", file.path.display(), file.bytes);
        }
    }

    if let Some(stage) = summary.failed_stage {
        println!("  Failed at:          {}", stage);
        for error in &summary.errors {
            println!("    - {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_args() {
        let cli = Cli::try_parse_from([
            "content-forge",
            "generate",
            "--input",
            "product.yaml",
            "--output",
            "site",
            "--offline",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.input, Some(PathBuf::from("product.yaml")));
                assert_eq!(args.output, Some(PathBuf::from("site")));
                assert!(args.offline);
                assert!(args.json);
            }
            Commands::Sample(_) => panic!("expected generate"),
        }
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_sample_product_has_required_fields() {
        let sample = sample_product();
        for key in crate::agents::REQUIRED_FIELDS {
            assert!(sample.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_load_product_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("product.yml");
        std::fs::write(&yaml_path, serde_yaml::to_string(&sample_product()).unwrap()).unwrap();
        assert_eq!(load_product_file(&yaml_path).unwrap(), sample_product());

        let json_path = dir.path().join("product.json");
        std::fs::write(&json_path, sample_product().to_string()).unwrap();
        assert_eq!(load_product_file(&json_path).unwrap(), sample_product());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(load_product_file(&broken).is_err());
    }
}
