//! Per-invocation execution context.
//!
//! A [`Runner`] binds a channel to the handler registry for exactly one
//! workflow run: it generates the run id, opens the per-run log file and
//! state snapshot path (both named `{YYYYMMDDhhmmss}-{run_id}`, so the two
//! artifacts pair by stem), injects the reserved state keys, and drives the
//! handler to completion with a snapshot on either side.

use crate::app::App;
use crate::channels::Channel;
use crate::error::WorkflowError;
use crate::run_log::RunLog;
use crate::state::{self, RUN_ID_KEY, State, WORKFLOW_NAME_KEY};
use chrono::Local;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

pub struct Runner {
    id: String,
    app: Arc<App>,
    channel: Box<dyn Channel>,
    log: RunLog,
    log_path: PathBuf,
    state_path: PathBuf,
}

impl Runner {
    /// Create a runner for one invocation of `channel.workflow_name()`.
    ///
    /// Creates the log and state directories if needed and opens the
    /// per-run log file. The snapshot file is not created until `run()`
    /// persists the initial state.
    pub fn new(app: Arc<App>, channel: Box<dyn Channel>) -> Result<Self, WorkflowError> {
        let id = run_id();
        let timestamp = Local::now().format("%Y%m%d%H%M%S").to_string();

        fs::create_dir_all(&app.log_dir)?;
        fs::create_dir_all(&app.state_dir)?;

        let log_path = app.log_dir.join(format!("{timestamp}-{id}.log"));
        let state_path = app.state_dir.join(format!("{timestamp}-{id}.json"));

        let log = RunLog::create(&log_path, &id)?;
        log.info(&format!(
            "Runner initialized: run_id={}, workflow={}",
            id,
            channel.workflow_name()
        ));
        log.debug(&format!("Log file: {}", log_path.display()));
        log.debug(&format!("Channel type: {}", channel.kind()));

        Ok(Self {
            id,
            app,
            channel,
            log,
            log_path,
            state_path,
        })
    }

    /// The 8-hex run identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    pub fn workflow_name(&self) -> &str {
        self.channel.workflow_name()
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// The per-run file logger, for handlers that want to leave a trail
    /// beyond progress reports.
    pub fn logger(&self) -> &RunLog {
        &self.log
    }

    /// Execute the workflow.
    ///
    /// Assembles the initial state from the channel with `run_id` and
    /// `workflow_name` set on top (framework keys always win), snapshots
    /// it, invokes the named handler, snapshots and returns the result.
    /// An unknown workflow name is reported as a workflow failure; handler
    /// errors propagate unchanged.
    pub fn run(&self) -> Result<State, WorkflowError> {
        let mut state = self.channel.initial_state().clone();
        state.insert(RUN_ID_KEY.into(), Value::String(self.id.clone()));
        state.insert(
            WORKFLOW_NAME_KEY.into(),
            Value::String(self.workflow_name().to_string()),
        );
        self.snapshot(&state)?;

        self.log
            .info(&format!("Workflow started: {}", self.workflow_name()));
        self.log.debug(&format!(
            "Initial state: {}",
            serde_json::to_string(&state).unwrap_or_default()
        ));

        let handler = match self.app.resolve(self.workflow_name()) {
            Ok(handler) => handler,
            Err(error) => {
                self.log.error(&format!(
                    "Workflow failed: {} - {}",
                    self.workflow_name(),
                    error
                ));
                return Err(error);
            }
        };

        let state = match handler(self, state) {
            Ok(next) => next,
            Err(error) => {
                self.log.error(&format!(
                    "Workflow failed: {} - {}",
                    self.workflow_name(),
                    error
                ));
                return Err(error);
            }
        };

        self.snapshot(&state)?;
        self.log
            .info(&format!("Workflow completed: {}", self.workflow_name()));
        self.log.debug(&format!(
            "Final state: {}",
            serde_json::to_string(&state).unwrap_or_default()
        ));
        Ok(state)
    }

    /// Persist a state snapshot to this run's `.json` file.
    pub fn snapshot(&self, state: &State) -> Result<(), WorkflowError> {
        state::write_snapshot(&self.state_path, state)
    }

    /// Report progress: logged at INFO, then delegated to the channel.
    pub fn report_progress(&self, message: &str) {
        self.log.info(&format!("Progress: {message}"));
        self.channel.report_progress(&self.id, message);
    }

    /// Report an error: logged at ERROR, then delegated to the channel.
    pub fn report_error(&self, message: &str) {
        self.log.error(&format!("Error reported: {message}"));
        self.channel.report_error(&self.id, message);
    }

    /// Signal that this run is unrecoverable but the failure is expected.
    ///
    /// Returns the error for the handler to propagate:
    ///
    /// ```ignore
    /// return Err(runner.fail("no credentials configured"));
    /// ```
    #[must_use]
    pub fn fail(&self, message: impl Into<String>) -> WorkflowError {
        let message = message.into();
        self.log.error(&format!("Workflow fatal error: {message}"));
        WorkflowError::Failed(message)
    }
}

/// Fresh 8-character lowercase-hex run id.
fn run_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::CliChannel;
    use serde_json::json;
    use tempfile::tempdir;

    fn test_app(dir: &Path) -> App {
        App::new(dir.join("logs"), dir.join("state"), dir.join("worktrees"))
    }

    fn echo_app(dir: &Path) -> App {
        let mut app = test_app(dir);
        app.register("echo", |_runner, mut state: State| {
            let prompt = state["prompt"].clone();
            state.insert("echoed".into(), prompt);
            Ok(state)
        })
        .unwrap();
        app
    }

    #[test]
    fn run_id_is_eight_lowercase_hex() {
        let id = run_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn run_injects_reserved_keys_and_invokes_handler() {
        let dir = tempdir().unwrap();
        let app = Arc::new(echo_app(dir.path()));

        let mut initial = State::new();
        initial.insert("prompt".into(), json!("hi"));
        let channel = CliChannel::new("echo", initial);
        let runner = Runner::new(app, Box::new(channel)).unwrap();

        let result = runner.run().unwrap();
        assert_eq!(result["prompt"], "hi");
        assert_eq!(result["echoed"], "hi");
        assert_eq!(result["run_id"], runner.id());
        assert_eq!(result["workflow_name"], "echo");
    }

    #[test]
    fn framework_keys_override_channel_state() {
        let dir = tempdir().unwrap();
        let app = Arc::new(echo_app(dir.path()));

        let mut initial = State::new();
        initial.insert("prompt".into(), json!("hi"));
        initial.insert("run_id".into(), json!("spoofed"));
        initial.insert("workflow_name".into(), json!("spoofed"));
        let channel = CliChannel::new("echo", initial);
        let runner = Runner::new(app, Box::new(channel)).unwrap();

        let result = runner.run().unwrap();
        assert_eq!(result["run_id"], runner.id());
        assert_eq!(result["workflow_name"], "echo");
    }

    #[test]
    fn log_and_state_files_share_a_stem() {
        let dir = tempdir().unwrap();
        let app = Arc::new(echo_app(dir.path()));

        let mut initial = State::new();
        initial.insert("prompt".into(), json!("hi"));
        let runner = Runner::new(app, Box::new(CliChannel::new("echo", initial))).unwrap();
        runner.run().unwrap();

        let log_stem = runner.log_path().file_stem().unwrap();
        let state_stem = runner.state_path().file_stem().unwrap();
        assert_eq!(log_stem, state_stem);
        assert!(runner.log_path().exists());
        assert!(runner.state_path().exists());
    }

    #[test]
    fn final_snapshot_matches_returned_state() {
        let dir = tempdir().unwrap();
        let app = Arc::new(echo_app(dir.path()));

        let mut initial = State::new();
        initial.insert("prompt".into(), json!("hi"));
        let runner = Runner::new(app, Box::new(CliChannel::new("echo", initial))).unwrap();
        let result = runner.run().unwrap();

        let on_disk = crate::state::read_snapshot(runner.state_path()).unwrap();
        assert_eq!(on_disk, result);
    }

    #[test]
    fn unknown_workflow_is_an_expected_failure() {
        let dir = tempdir().unwrap();
        let app = Arc::new(test_app(dir.path()));

        let runner = Runner::new(app, Box::new(CliChannel::new("nope", State::new()))).unwrap();
        let error = runner.run().unwrap_err();
        assert!(error.is_expected());
        assert_eq!(error.to_string(), "Unknown workflow: nope");
    }

    #[test]
    fn fail_logs_and_returns_failed() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.register("doomed", |runner: &Runner, _state| Err(runner.fail("boom")))
            .unwrap();
        let app = Arc::new(app);

        let runner = Runner::new(app, Box::new(CliChannel::new("doomed", State::new()))).unwrap();
        let error = runner.run().unwrap_err();
        assert_eq!(error.to_string(), "boom");
        assert!(error.is_expected());

        let log = std::fs::read_to_string(runner.log_path()).unwrap();
        assert!(log.contains("Workflow fatal error: boom"));
        assert!(log.contains("Workflow failed: doomed - boom"));
    }

    #[test]
    fn run_writes_lifecycle_log_lines() {
        let dir = tempdir().unwrap();
        let app = Arc::new(echo_app(dir.path()));

        let mut initial = State::new();
        initial.insert("prompt".into(), json!("hi"));
        let runner = Runner::new(app, Box::new(CliChannel::new("echo", initial))).unwrap();
        runner.report_progress("halfway");
        runner.run().unwrap();

        let log = std::fs::read_to_string(runner.log_path()).unwrap();
        assert!(log.contains(&format!("Runner initialized: run_id={}, workflow=echo", runner.id())));
        assert!(log.contains("Channel type: cli"));
        assert!(log.contains("Progress: halfway"));
        assert!(log.contains("Workflow started: echo"));
        assert!(log.contains("Workflow completed: echo"));
    }
}
