//! HTTP server: the webhook trigger and Slack event endpoints.

pub mod slack_events;
pub mod webhook;

use crate::app::App;
use crate::runner::Runner;
use anyhow::Context as _;
use axum::Router;
use axum::routing::post;
use slack_events::SlackEventProcessor;
use std::sync::Arc;

/// Shared state for the HTTP routes.
pub struct ServerState {
    pub app: Arc<App>,
    pub slack: SlackEventProcessor,
}

/// Build the router with both endpoints mounted.
pub fn router(app: Arc<App>) -> Router {
    let state = Arc::new(ServerState {
        slack: SlackEventProcessor::new(app.clone()),
        app,
    });
    Router::new()
        .route("/webhook", post(webhook::handle))
        .route("/slack_event", post(slack_events::handle))
        .with_state(state)
}

/// Bind and serve until the process is terminated.
pub async fn serve(app: Arc<App>, host: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "antkeeper server listening");
    axum::serve(listener, router(app)).await?;
    Ok(())
}

/// Run a workflow on a blocking worker with the background failure policy:
/// expected failures are already recorded in the per-run log and reported
/// through the channel, so they are swallowed; anything else gets one error
/// line and must not take the server down.
pub(crate) fn run_workflow_background(runner: Runner) {
    let workflow = runner.workflow_name().to_string();
    match runner.run() {
        Ok(_) => {}
        Err(error) if error.is_expected() => {}
        Err(error) => {
            tracing::error!(%error, workflow = %workflow, "unexpected error in workflow");
        }
    }
}
