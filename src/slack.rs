//! Outbound Slack Web API client.
//!
//! Two call paths share the same endpoints: async for the event coalescer
//! (which runs on the server's event loop) and blocking for the thread-reply
//! channel (which runs on a worker thread). API failures here are boundary
//! noise: they are logged and swallowed and must never affect coalescer
//! state or crash the server.

use crate::config;
use serde_json::{Value, json};

/// Call a Slack API method, returning the decoded JSON response.
pub async fn call(token: &str, method: &str, payload: Value) -> anyhow::Result<Value> {
    let url = format!("{}/{}", config::slack_api_base().trim_end_matches('/'), method);
    let response = reqwest::Client::new()
        .post(url)
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await?;
    Ok(response.json().await?)
}

/// Blocking variant of [`call`] for code running on worker threads.
///
/// Must not be invoked from an async context; the blocking client would
/// panic there.
pub fn call_blocking(token: &str, method: &str, payload: Value) -> anyhow::Result<Value> {
    let url = format!("{}/{}", config::slack_api_base().trim_end_matches('/'), method);
    let response = reqwest::blocking::Client::new()
        .post(url)
        .bearer_auth(token)
        .json(&payload)
        .send()?;
    Ok(response.json()?)
}

/// Post a thumbs-up reaction to a message. Failures are logged and swallowed.
pub async fn add_reaction(token: &str, channel: &str, timestamp: &str) {
    let payload = json!({
        "channel": channel,
        "timestamp": timestamp,
        "name": "thumbsup",
    });
    if let Err(error) = call(token, "reactions.add", payload).await {
        tracing::warn!(%error, channel, timestamp, "failed to add slack reaction");
    }
}

/// Post a message into a thread. Failures are logged and swallowed.
pub async fn post_thread_message(token: &str, channel: &str, thread_ts: &str, text: &str) {
    let payload = json!({
        "channel": channel,
        "thread_ts": thread_ts,
        "text": text,
    });
    if let Err(error) = call(token, "chat.postMessage", payload).await {
        tracing::warn!(%error, channel, thread_ts, "failed to post slack thread message");
    }
}
