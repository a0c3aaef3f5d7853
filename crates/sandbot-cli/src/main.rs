//! Sandbot CLI — entry point.
//!
//! `sandbot [--verbose] <PROMPT>` runs one prompt through the agent loop inside
//! the configured working directory and prints the final answer.
//!
//! Exit codes: 0 on a final answer, 1 when the run hit the iteration cap or
//! failed (config, credentials, LLM errors), 2 for usage errors (clap).

mod helpers;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use sandbot_agent::tools::{Dispatcher, ToolRegistry};
use sandbot_agent::{AgentLoop, RunOutcome};
use sandbot_core::config::{get_config_path, load_config, Config};
use sandbot_core::utils::expand_home;
use sandbot_providers::http_provider::create_provider;
use sandbot_providers::traits::LlmRequestConfig;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Sandbot — let an LLM work on a project through sandboxed file and script tools
#[derive(Parser, Debug)]
#[command(name = "sandbot", version, about, long_about = None)]
struct Cli {
    /// The instruction for the agent
    prompt: String,

    /// Print the prompt, token usage, and every function call with its result
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(RunOutcome::Completed { .. }) => ExitCode::SUCCESS,
        Ok(RunOutcome::Unresolved { .. }) => ExitCode::FAILURE,
        Err(e) => {
            helpers::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<RunOutcome> {
    let config = load_config(None);
    let agent_loop = build_agent_loop(&config, cli.verbose)?;

    if cli.verbose {
        helpers::print_prompt(&cli.prompt);
    }

    let outcome = agent_loop
        .run(&cli.prompt)
        .await
        .context("agent run failed")?;

    match &outcome {
        RunOutcome::Completed { answer, .. } => helpers::print_response(answer),
        RunOutcome::Unresolved { iterations, .. } => helpers::print_unresolved(*iterations),
    }
    if cli.verbose {
        helpers::print_usage(outcome.usage());
    }

    Ok(outcome)
}

/// Build an `AgentLoop` from the loaded configuration.
fn build_agent_loop(config: &Config, verbose: bool) -> Result<AgentLoop> {
    let agent = &config.agent;
    let root = resolve_working_root(&agent.working_dir)?;
    let config_path = get_config_path();
    if config_within_root(&root, &config_path) {
        warn!(
            config = %config_path.display(),
            "config file is inside the working directory; the agent can read its API keys"
        );
    }

    let providers_map = config.providers.to_map();
    let provider = create_provider(&agent.model, &providers_map).map_err(|e| anyhow::anyhow!(e))?;

    let registry = ToolRegistry::builtin(&config.tools.script);
    let dispatcher = Dispatcher::new(registry, root).with_verbose(verbose);

    Ok(AgentLoop::new(
        Arc::new(provider),
        dispatcher,
        Some(agent.model.clone()),
        Some(agent.max_iterations as usize),
        Some(LlmRequestConfig::from(agent)),
    ))
}

/// Expand `~`, canonicalize, and require a directory.
fn resolve_working_root(working_dir: &str) -> Result<PathBuf> {
    let expanded = expand_home(working_dir);
    let root = expanded
        .canonicalize()
        .with_context(|| format!("working directory not found: {}", expanded.display()))?;
    if !root.is_dir() {
        bail!("working directory is not a directory: {}", root.display());
    }
    info!(root = %root.display(), "working root resolved");
    Ok(root)
}

/// Whether the (existing) config file sits under the sandbox root.
fn config_within_root(root: &Path, config_path: &Path) -> bool {
    config_path
        .canonicalize()
        .map(|path| path.starts_with(root))
        .unwrap_or(false)
}

/// Initialize tracing/logging. `RUST_LOG` wins when set; logs go to stderr.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose {
        "sandbot_agent=debug,sandbot_providers=debug,info"
    } else {
        "sandbot_agent=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
