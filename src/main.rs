//! plancraft command-line entry point.
//!
//! Usage: `plancraft <task> <input-file> [system-prompt-file]`
//!
//! Runs the task, enriches the output with detected skills when
//! `PLANCRAFT_SKILLS_DIR` is set, prints the result to stdout and a usage
//! summary to stderr.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use plancraft::budget::{format_cost, UsageLedger};
use plancraft::skills::{self, DetectionContext, SkillRegistry};
use plancraft::{FallbackOrchestrator, OrchestratorConfig};

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a senior product manager. Produce clear, structured planning documents in markdown.";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (task, input_path) = match (args.first(), args.get(1)) {
        (Some(task), Some(input)) => (task.clone(), input.clone()),
        _ => anyhow::bail!("usage: plancraft <task> <input-file> [system-prompt-file]"),
    };

    let user_text = tokio::fs::read_to_string(&input_path)
        .await
        .with_context(|| format!("Failed to read input file {}", input_path))?;
    let system_prompt = match args.get(2) {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt {}", path))?,
        None => DEFAULT_SYSTEM_PROMPT.to_string(),
    };

    let config = OrchestratorConfig::from_env().context("Failed to load configuration")?;
    let orchestrator = FallbackOrchestrator::from_config(&config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling in-flight request");
            on_interrupt.cancel();
        }
    });

    let output = orchestrator
        .execute_with_cancel(&task, &system_prompt, &user_text, None, &cancel)
        .await?;

    let mut ledger = UsageLedger::new();
    ledger.record(output.usage.clone());

    let content = match &config.skills_dir {
        Some(dir) => {
            let context = DetectionContext::new()
                .with_field(user_text.as_str())
                .with_field(output.content.as_str());
            let registry = SkillRegistry::load_or_empty(dir).await;
            skills::enrich_output(&registry, &context, config.detail_level, &output.content)
        }
        None => output.content,
    };

    println!("{}", content);

    let summary = ledger.summary();
    eprintln!(
        "model={} tokens={} (prompt {}, completion {}) cost={}{}",
        output.usage.model,
        summary.total_tokens,
        summary.prompt_tokens,
        summary.completion_tokens,
        format_cost(summary.cost.total),
        if summary.unpriced_calls > 0 { " [unpriced]" } else { "" }
    );

    Ok(())
}
