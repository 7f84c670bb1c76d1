//! Line-oriented boundary: progress to stdout, errors to stderr.

use super::Channel;
use crate::state::State;
use std::io::Write;

pub struct CliChannel {
    workflow_name: String,
    initial_state: State,
}

impl CliChannel {
    pub fn new(workflow_name: impl Into<String>, initial_state: State) -> Self {
        Self {
            workflow_name: workflow_name.into(),
            initial_state,
        }
    }
}

impl Channel for CliChannel {
    fn kind(&self) -> &'static str {
        "cli"
    }

    fn workflow_name(&self) -> &str {
        &self.workflow_name
    }

    fn initial_state(&self) -> &State {
        &self.initial_state
    }

    fn report_progress(&self, run_id: &str, message: &str) {
        let mut stdout = std::io::stdout();
        let _ = writeln!(stdout, "[{}, {}] {}", self.workflow_name, run_id, message)
            .and_then(|()| stdout.flush());
    }

    fn report_error(&self, run_id: &str, message: &str) {
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "[{}, {}] {}", self.workflow_name, run_id, message)
            .and_then(|()| stderr.flush());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_workflow_name_and_state() {
        let mut state = State::new();
        state.insert("prompt".into(), serde_json::json!("hi"));
        let channel = CliChannel::new("echo", state);

        assert_eq!(channel.kind(), "cli");
        assert_eq!(channel.workflow_name(), "echo");
        assert_eq!(channel.initial_state()["prompt"], "hi");
    }
}
