//! Handler registry.
//!
//! The [`App`] is the process-scoped mapping from workflow name to handler,
//! shared by every boundary (CLI, webhook, Slack). It also owns the
//! directory paths for per-run artifacts. It carries no behavior beyond
//! lookup.

use crate::error::WorkflowError;
use crate::runner::Runner;
use crate::state::State;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// A registered workflow handler.
///
/// Handlers are synchronous: they receive the runner (for progress
/// reporting, logging, and failure signaling) and the current state, and
/// return the next state. They run on blocking worker threads and may block
/// on I/O freely.
pub type Handler = Arc<dyn Fn(&Runner, State) -> Result<State, WorkflowError> + Send + Sync>;

/// Registry of workflow handlers plus the artifact directory configuration.
pub struct App {
    handlers: HashMap<String, Handler>,
    /// Directory for per-run log files.
    pub log_dir: PathBuf,
    /// Directory for per-run state snapshots.
    pub state_dir: PathBuf,
    /// Directory for isolated git worktrees created by handlers.
    pub worktree_dir: PathBuf,
}

impl App {
    /// Create a registry with explicit artifact directories.
    pub fn new(
        log_dir: impl Into<PathBuf>,
        state_dir: impl Into<PathBuf>,
        worktree_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            handlers: HashMap::new(),
            log_dir: log_dir.into(),
            state_dir: state_dir.into(),
            worktree_dir: worktree_dir.into(),
        }
    }

    /// Register a handler under a name.
    ///
    /// Names are unique; registering a second handler under an existing name
    /// fails rather than silently overriding.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> Result<(), WorkflowError>
    where
        F: Fn(&Runner, State) -> Result<State, WorkflowError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(WorkflowError::AlreadyRegistered(name));
        }
        self.handlers.insert(name, Arc::new(handler));
        Ok(())
    }

    /// Look up a handler by name.
    pub fn resolve(&self, name: &str) -> Result<Handler, WorkflowError> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownWorkflow(name.to_string()))
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new("logs", "state", "worktrees")
    }
}
