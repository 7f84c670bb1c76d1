//! Workflow composition: fold state through a sequence of handlers.

use crate::error::WorkflowError;
use crate::runner::Runner;
use crate::state::State;

/// Apply registered handlers in order, snapshotting state after each step.
///
/// Steps are referenced by registry name so each one can be logged as it
/// runs. This is a plain left fold; composition is function application,
/// not a separate scheduling entity. If a step fails the fold aborts and
/// the last snapshot on disk is the recoverable artifact.
pub fn run_workflow(
    runner: &Runner,
    mut state: State,
    steps: &[&str],
) -> Result<State, WorkflowError> {
    for name in steps {
        runner.logger().info(&format!("Step started: {name}"));
        let handler = runner.app().resolve(name)?;
        state = handler(runner, state)?;
        runner.snapshot(&state)?;
        let keys: Vec<&str> = state.keys().map(String::as_str).collect();
        runner
            .logger()
            .debug(&format!("Step completed: {name}, state keys: [{}]", keys.join(", ")));
    }
    Ok(state)
}
