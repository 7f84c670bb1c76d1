//! `POST /webhook`: validate, start a runner in the background, answer with
//! the run id before the handler completes.

use super::{ServerState, run_workflow_background};
use crate::channels::ApiChannel;
use crate::runner::Runner;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct WebhookRequest {
    workflow_name: String,
    #[serde(default)]
    initial_state: crate::state::State,
}

#[derive(Debug, Serialize)]
pub(crate) struct WebhookResponse {
    run_id: String,
}

pub(crate) async fn handle(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<WebhookRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": rejection.body_text() })),
            )
                .into_response();
        }
    };

    if let Err(error) = state.app.resolve(&request.workflow_name) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": error.to_string() })),
        )
            .into_response();
    }

    let channel = ApiChannel::new(&request.workflow_name, request.initial_state);
    let runner = match Runner::new(state.app.clone(), Box::new(channel)) {
        Ok(runner) => runner,
        Err(error) => {
            tracing::error!(%error, workflow = %request.workflow_name, "failed to construct runner");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "failed to start workflow" })),
            )
                .into_response();
        }
    };

    let run_id = runner.id().to_string();
    tokio::task::spawn_blocking(move || run_workflow_background(runner));
    (StatusCode::OK, Json(WebhookResponse { run_id })).into_response()
}
