//! Webhook boundary: workflows triggered over HTTP.
//!
//! Progress goes to stdout and errors to stderr so both show up in the
//! server's log stream; the HTTP caller only ever sees the run id.

use super::Channel;
use crate::state::State;
use std::io::Write;

pub struct ApiChannel {
    workflow_name: String,
    initial_state: State,
}

impl ApiChannel {
    pub fn new(workflow_name: impl Into<String>, initial_state: State) -> Self {
        Self {
            workflow_name: workflow_name.into(),
            initial_state,
        }
    }
}

impl Channel for ApiChannel {
    fn kind(&self) -> &'static str {
        "api"
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
