//! `POST /slack_event`: event routing, the pending-message store, and the
//! debounce timers.
//!
//! A logical user request is the burst of {mention, edits to it, thread
//! replies under it} that ends with a quiet window of `COOLDOWN_SECONDS`.
//! The coalescer folds each burst into one pending message per
//! `(channel_id, ts)` key and dispatches exactly one workflow when the
//! window elapses. Every state transition except timer expiry cancels the
//! key's live timer and starts a fresh one.

use super::{ServerState, run_workflow_background};
use crate::app::App;
use crate::channels::SlackChannel;
use crate::config;
use crate::runner::Runner;
use crate::slack;
use crate::state::State;
use axum::Json;
use axum::extract::State as AxumState;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use regex::Regex;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

type PendingKey = (String, String);

/// A mention waiting out its debounce cooldown.
///
/// `text` starts as the cleaned mention, grows on thread replies, and is
/// replaced on edits. `workflow_name` is fixed at creation time from the
/// first token of the cleaned text.
struct PendingMessage {
    channel_id: String,
    ts: String,
    user: String,
    text: String,
    files: Vec<Value>,
    workflow_name: String,
    timer: Option<Timer>,
}

/// Handle to a live cooldown timer.
///
/// Cancellation aborts the sleeping task, but an abort can race the sleep
/// expiring; the fire body must find its own generation still recorded in
/// the map before it may dispatch.
struct Timer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl Timer {
    fn cancel(self) {
        self.handle.abort();
    }
}

#[derive(Clone)]
pub struct SlackEventProcessor {
    app: Arc<App>,
    pending: Arc<Mutex<HashMap<PendingKey, PendingMessage>>>,
    timer_seq: Arc<AtomicU64>,
}

pub(crate) async fn handle(
    AxumState(state): AxumState<Arc<ServerState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": rejection.body_text() })),
            )
                .into_response();
        }
    };

    // The URL verification handshake works without credentials; everything
    // else requires the bot token and user id to be configured.
    if body.get("type").and_then(Value::as_str) != Some("url_verification") {
        let missing = config::missing_slack_vars();
        if !missing.is_empty() {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "detail": format!(
                        "Missing required environment variables: {}",
                        missing.join(", ")
                    )
                })),
            )
                .into_response();
        }
    }

    Json(state.slack.handle_event(&body).await).into_response()
}

impl SlackEventProcessor {
    pub fn new(app: Arc<App>) -> Self {
        Self {
            app,
            pending: Arc::new(Mutex::new(HashMap::new())),
            timer_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Route one event envelope. Always answers 200-shaped JSON; the first
    /// matching clause wins, and thread-reply detection must run before
    /// mention detection so a reply to a pending mention is never treated
    /// as a fresh one.
    pub async fn handle_event(&self, body: &Value) -> Value {
        if body.get("type").and_then(Value::as_str) == Some("url_verification") {
            return json!({ "challenge": body.get("challenge").cloned().unwrap_or(Value::Null) });
        }

        let event = body
            .get("event")
            .and_then(Value::as_object)
            .filter(|event| !event.is_empty());
        let Some(event) = event else {
            return json!({ "ok": true });
        };

        // Drop the bot's own outbound replies so they can't re-enter as
        // mentions and loop.
        if is_bot_message(event) {
            return json!({ "ok": true });
        }

        let token = config::bot_token();
        let bot_user_id = config::bot_user_id();
        let cooldown = config::cooldown();

        let channel_id = str_field(event, "channel");
        let event_ts = str_field(event, "ts");

        if let Some(thread_ts) = event.get("thread_ts").and_then(Value::as_str) {
            if thread_ts != event_ts {
                return self
                    .handle_thread_reply(event, &channel_id, &event_ts, thread_ts, &token, cooldown)
                    .await;
            }
        }

        match event.get("subtype").and_then(Value::as_str) {
            Some("message_changed") => {
                return self.handle_edit(event, &channel_id, &token, cooldown).await;
            }
            Some("message_deleted") => {
                return self.handle_delete(event, &channel_id).await;
            }
            _ => {}
        }

        let event_type = str_field(event, "type");
        let subtype = event.get("subtype").and_then(Value::as_str);
        if (event_type == "app_mention" || event_type == "message")
            && matches!(subtype, None | Some("file_share"))
        {
            return self
                .handle_mention(event, &channel_id, &event_ts, &bot_user_id, &token, cooldown)
                .await;
        }

        json!({ "ok": true })
    }

    /// A reply in a pending mention's thread: fold the text and files into
    /// the pending message, reset the timer, thank the author with a
    /// reaction. Replies to unknown threads are dropped silently.
    async fn handle_thread_reply(
        &self,
        event: &Map<String, Value>,
        channel_id: &str,
        event_ts: &str,
        thread_ts: &str,
        token: &str,
        cooldown: Duration,
    ) -> Value {
        let key = (channel_id.to_string(), thread_ts.to_string());
        let accumulated = {
            let mut pending = self.pending.lock().await;
            match pending.get_mut(&key) {
                Some(entry) => {
                    if let Some(timer) = entry.timer.take() {
                        timer.cancel();
                    }
                    entry.text.push('\n');
                    entry.text.push_str(&str_field(event, "text"));
                    entry.files.extend(files_field(event));
                    entry.timer = Some(self.start_timer(key.clone(), token.to_string(), cooldown));
                    true
                }
                None => false,
            }
        };

        if accumulated {
            slack::add_reaction(token, channel_id, event_ts).await;
        }
        json!({ "ok": true })
    }

    /// An edit to a pending mention: replace the accumulated text with the
    /// cleaned new text and reset the timer.
    async fn handle_edit(
        &self,
        event: &Map<String, Value>,
        channel_id: &str,
        token: &str,
        cooldown: Duration,
    ) -> Value {
        let Some(nested) = event.get("message").and_then(Value::as_object) else {
            return json!({ "ok": true });
        };
        let key = (channel_id.to_string(), str_field(nested, "ts"));

        let mut pending = self.pending.lock().await;
        if let Some(entry) = pending.get_mut(&key) {
            if let Some(timer) = entry.timer.take() {
                timer.cancel();
            }
            entry.text = strip_mention(&str_field(nested, "text")).to_string();
            entry.timer = Some(self.start_timer(key.clone(), token.to_string(), cooldown));
        }
        json!({ "ok": true })
    }

    /// Deleting the original mention cancels the whole request.
    async fn handle_delete(&self, event: &Map<String, Value>, channel_id: &str) -> Value {
        let key = (channel_id.to_string(), str_field(event, "deleted_ts"));
        let mut pending = self.pending.lock().await;
        if let Some(mut entry) = pending.remove(&key) {
            if let Some(timer) = entry.timer.take() {
                timer.cancel();
            }
        }
        json!({ "ok": true })
    }

    /// A fresh mention of the bot: create the pending entry keyed by the
    /// message's own timestamp and start the cooldown. Duplicate deliveries
    /// of the same `(channel, ts)` are skipped.
    async fn handle_mention(
        &self,
        event: &Map<String, Value>,
        channel_id: &str,
        event_ts: &str,
        bot_user_id: &str,
        token: &str,
        cooldown: Duration,
    ) -> Value {
        let text = str_field(event, "text");
        if !is_bot_mention(&text, bot_user_id) {
            return json!({ "ok": true });
        }

        let clean_text = strip_mention(&text).to_string();
        let workflow_name = clean_text
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();

        let key = (channel_id.to_string(), event_ts.to_string());
        {
            let mut pending = self.pending.lock().await;
            if pending.contains_key(&key) {
                return json!({ "ok": true });
            }
            let entry = PendingMessage {
                channel_id: channel_id.to_string(),
                ts: event_ts.to_string(),
                user: str_field(event, "user"),
                text: clean_text,
                files: files_field(event),
                workflow_name,
                timer: Some(self.start_timer(key.clone(), token.to_string(), cooldown)),
            };
            pending.insert(key, entry);
        }

        slack::add_reaction(token, channel_id, event_ts).await;
        json!({ "ok": true })
    }

    /// Spawn a cooldown timer for `key`. Each timer carries a fresh
    /// generation; the entry's recorded generation is what authorizes a
    /// wake-up to dispatch.
    fn start_timer(&self, key: PendingKey, token: String, cooldown: Duration) -> Timer {
        let generation = self.timer_seq.fetch_add(1, Ordering::Relaxed);
        let processor = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(cooldown).await;
            processor.on_timer_fire(key, generation, token).await;
        });
        Timer { generation, handle }
    }

    /// The quiet window elapsed: atomically claim the pending message, then
    /// acknowledge in the thread and dispatch the workflow on a worker
    /// thread. Workflow execution never touches the pending map.
    async fn on_timer_fire(&self, key: PendingKey, generation: u64, token: String) {
        let entry = {
            let mut pending = self.pending.lock().await;
            match pending.get(&key) {
                Some(existing)
                    if existing
                        .timer
                        .as_ref()
                        .is_some_and(|timer| timer.generation == generation) =>
                {
                    pending.remove(&key)
                }
                // Gone, or superseded by a newer timer whose abort raced
                // this wake-up.
                _ => None,
            }
        };
        let Some(entry) = entry else {
            return;
        };

        slack::post_thread_message(
            &token,
            &entry.channel_id,
            &entry.ts,
            "Processing your request...",
        )
        .await;

        if let Err(error) = self.app.resolve(&entry.workflow_name) {
            slack::post_thread_message(&token, &entry.channel_id, &entry.ts, &error.to_string())
                .await;
            return;
        }

        let mut initial_state = State::new();
        initial_state.insert("prompt".into(), Value::String(entry.text.clone()));
        initial_state.insert("slack_user".into(), Value::String(entry.user.clone()));
        if !entry.files.is_empty() {
            initial_state.insert("files".into(), Value::Array(entry.files.clone()));
        }

        let channel = SlackChannel::new(
            &entry.workflow_name,
            initial_state,
            token,
            entry.channel_id.clone(),
            entry.ts.clone(),
        );
        let runner = match Runner::new(self.app.clone(), Box::new(channel)) {
            Ok(runner) => runner,
            Err(error) => {
                tracing::error!(%error, workflow = %entry.workflow_name, "failed to construct runner");
                return;
            }
        };
        tokio::task::spawn_blocking(move || run_workflow_background(runner));
    }

    #[cfg(test)]
    pub(crate) async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn pending_text(&self, channel_id: &str, ts: &str) -> Option<String> {
        let pending = self.pending.lock().await;
        pending
            .get(&(channel_id.to_string(), ts.to_string()))
            .map(|entry| entry.text.clone())
    }
}

/// Whether the event came from a bot (our own replies included).
fn is_bot_message(event: &Map<String, Value>) -> bool {
    event
        .get("bot_id")
        .and_then(Value::as_str)
        .is_some_and(|bot_id| !bot_id.is_empty())
}

/// Whether the text mentions the bot user.
fn is_bot_mention(text: &str, bot_user_id: &str) -> bool {
    text.contains(&format!("<@{bot_user_id}>"))
}

/// Remove a leading bot mention and surrounding whitespace.
fn strip_mention(text: &str) -> &str {
    static MENTION: OnceLock<Regex> = OnceLock::new();
    let mention = MENTION.get_or_init(|| {
        Regex::new(r"^\s*<@U[A-Z0-9]+>\s*").expect("mention pattern is valid")
    });
    match mention.find(text) {
        Some(found) => &text[found.end()..],
        None => text,
    }
}

fn str_field(event: &Map<String, Value>, key: &str) -> String {
    event
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn files_field(event: &Map<String, Value>) -> Vec<Value> {
    event
        .get("files")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
