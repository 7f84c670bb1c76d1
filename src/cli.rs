//! Command-line front-end.

use crate::app::App;
use crate::channels::CliChannel;
use crate::error::WorkflowError;
use crate::runner::Runner;
use crate::state::State;
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::{IsTerminal as _, Read as _};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "antkeeper", about = "Workflow execution engine", version)]
pub struct Cli {
    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Execute a workflow and print its final state.
    Run {
        /// Name of the registered workflow to execute.
        workflow_name: String,

        /// Prompt files, concatenated into the initial state's "prompt".
        /// With no files, piped standard input becomes the prompt.
        prompt_files: Vec<PathBuf>,

        /// Initial state entry as key=value (repeatable).
        #[arg(long = "initial-state", value_name = "KEY=VALUE")]
        initial_state: Vec<String>,

        /// Model identifier, placed into the initial state as "model".
        #[arg(long)]
        model: Option<String>,
    },
    /// Start the HTTP server.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

/// The registry every front-end starts from. User deployments add their
/// own handlers here in `main`; the built-in `healthcheck` exists so a
/// fresh install can verify the pipeline end to end.
pub fn builtin_app() -> Result<App, WorkflowError> {
    let mut app = App::default();
    app.register("healthcheck", |runner: &Runner, mut state: State| {
        runner.report_progress("Running healthcheck");
        runner.logger().info("healthcheck ok");
        state.insert("status".into(), Value::String("ok".into()));
        Ok(state)
    })?;
    Ok(app)
}

/// Parse repeated `key=value` pairs into string-valued state entries.
pub fn parse_state_pairs(pairs: &[String]) -> anyhow::Result<State> {
    let mut state = State::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            anyhow::bail!("invalid --initial-state value (expected key=value): {pair}");
        };
        state.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(state)
}

/// Concatenate prompt files (no separator); with no files, read piped stdin.
/// Returns `None` when there is no prompt source at all.
fn gather_prompt(prompt_files: &[PathBuf]) -> anyhow::Result<Option<String>> {
    if !prompt_files.is_empty() {
        let mut prompt = String::new();
        for path in prompt_files {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read prompt file: {}", path.display()))?;
            prompt.push_str(&content);
        }
        return Ok(Some(prompt));
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut prompt = String::new();
    stdin.read_to_string(&mut prompt)?;
    Ok(Some(prompt))
}

/// Assemble the initial state for a `run` invocation.
pub fn build_initial_state(
    prompt: Option<String>,
    pairs: &[String],
    model: Option<&str>,
) -> anyhow::Result<State> {
    let mut state = parse_state_pairs(pairs)?;
    if let Some(prompt) = prompt {
        state.insert("prompt".into(), Value::String(prompt));
    }
    if let Some(model) = model {
        state.insert("model".into(), Value::String(model.to_string()));
    }
    Ok(state)
}

/// Execute the `run` subcommand. Exit-code policy lives in `main`: this
/// returns the workflow result or the error for the caller to render.
pub fn execute_run(
    app: Arc<App>,
    workflow_name: &str,
    prompt_files: &[PathBuf],
    pairs: &[String],
    model: Option<&str>,
) -> Result<State, WorkflowError> {
    let prompt = gather_prompt(prompt_files).map_err(WorkflowError::Other)?;
    let initial_state = build_initial_state(prompt, pairs, model).map_err(WorkflowError::Other)?;
    let channel = CliChannel::new(workflow_name, initial_state);
    let runner = Runner::new(app, Box::new(channel))?;
    tracing::debug!(run_id = runner.id(), workflow = workflow_name, "runner created");
    runner.run()
}
