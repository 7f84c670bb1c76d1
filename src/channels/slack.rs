//! Thread-reply boundary: progress and errors posted back into the Slack
//! thread that triggered the workflow.
//!
//! Uses the blocking Slack client because handler code runs on a worker
//! thread. The token, channel id, and thread timestamp are captured at
//! construction and immutable for the life of the runner. HTTP faults are
//! logged and swallowed; a flaky chat API must never surface as a handler
//! error.

use super::Channel;
use crate::slack;
use crate::state::State;
use serde_json::json;

pub struct SlackChannel {
    workflow_name: String,
    initial_state: State,
    token: String,
    channel_id: String,
    thread_ts: String,
}

impl SlackChannel {
    pub fn new(
        workflow_name: impl Into<String>,
        initial_state: State,
        token: impl Into<String>,
        channel_id: impl Into<String>,
        thread_ts: impl Into<String>,
    ) -> Self {
        Self {
            workflow_name: workflow_name.into(),
            initial_state,
            token: token.into(),
            channel_id: channel_id.into(),
            thread_ts: thread_ts.into(),
        }
    }

    fn post_to_thread(&self, text: &str) {
        let payload = json!({
            "channel": self.channel_id,
            "thread_ts": self.thread_ts,
            "text": text,
        });
        if let Err(error) = slack::call_blocking(&self.token, "chat.postMessage", payload) {
            tracing::error!(
                %error,
                channel = %self.channel_id,
                thread_ts = %self.thread_ts,
                "failed to post to slack thread"
            );
        }
    }
}

impl Channel for SlackChannel {
    fn kind(&self) -> &'static str {
        "slack"
    }

    fn workflow_name(&self) -> &str {
        &self.workflow_name
    }

    fn initial_state(&self) -> &State {
        &self.initial_state
    }

    fn report_progress(&self, run_id: &str, message: &str) {
        self.post_to_thread(&format!("[{}, {}] {}", self.workflow_name, run_id, message));
    }

    fn report_error(&self, run_id: &str, message: &str) {
        self.post_to_thread(&format!(
            "[{}, {}] [ERROR] {}",
            self.workflow_name, run_id, message
        ));
    }
}
