//! Run execution endpoints.
//!
//! The catalog supplies a fresh engine per request; handlers run it to
//! completion and return the final state alongside step and truncation
//! accounting, so callers can tell a bounded run from a finished one.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, Router},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::Config;
use crate::runtime::{EngineError, RunReport, StateMap};
use crate::workflow::summarize::{self, keys};
use crate::workflow::FlowCatalog;

/// Shared application state for the run endpoints.
#[derive(Clone)]
pub struct AppState {
    /// Read-only flow catalog; a fresh engine is built from it per request
    pub catalog: Arc<FlowCatalog>,
    /// Application configuration
    pub config: Config,
}

/// Request body for the summarize endpoint
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
}

/// Response for the summarize endpoint
#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub final_summary: String,
    pub steps: u32,
    pub truncated: bool,
}

/// Create the run execution routes
pub fn create_run_routes() -> Router<AppState> {
    Router::new()
        .route("/api/summarize", post(summarize_text))
        .route("/api/runs/{flow_id}", post(execute_run))
        .route("/api/workflows", get(list_flows))
}

/// Run the built-in summarize flow over one text payload
///
/// POST /api/summarize
/// Body: { "text": "..." }
async fn summarize_text(
    State(state): State<AppState>,
    Json(payload): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, StatusCode> {
    let mut initial = StateMap::new();
    initial.insert(keys::INPUT_TEXT.to_string(), Value::String(payload.text));

    let report = run_flow(&state, summarize::FLOW_ID, initial).await?;

    // Absent key means an empty summary, not an error.
    let final_summary = report.state.get_str_or(keys::FINAL_SUMMARY, "").to_owned();

    Ok(Json(SummarizeResponse {
        final_summary,
        steps: report.steps,
        truncated: report.truncated,
    }))
}

/// Run any registered flow with the request body as the initial state
///
/// POST /api/runs/{flow_id}
/// Body: JSON object merged in as the initial state (empty body allowed)
async fn execute_run(
    State(state): State<AppState>,
    Path(flow_id): Path<String>,
    body: String,
) -> Result<Json<Value>, StatusCode> {
    tracing::info!("📥 Run request received for flow: {}", flow_id);

    // Parse the body manually to handle errors gracefully.
    let initial = if body.trim().is_empty() {
        StateMap::new()
    } else {
        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                tracing::warn!(
                    "❌ Run request for '{}' must carry a JSON object, got: {}",
                    flow_id,
                    value_kind(&other)
                );
                return Err(StatusCode::BAD_REQUEST);
            }
            Err(e) => {
                tracing::warn!("❌ Invalid JSON payload for flow '{}' - Error: {}", flow_id, e);
                return Err(StatusCode::BAD_REQUEST);
            }
        }
    };

    let report = run_flow(&state, &flow_id, initial).await?;

    Ok(Json(json!({
        "state": report.state,
        "steps": report.steps,
        "truncated": report.truncated,
    })))
}

/// List all registered flows
///
/// GET /api/workflows
async fn list_flows(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "workflows": state.catalog.list() }))
}

/// Build a fresh engine from the catalog and run it to completion.
async fn run_flow(
    state: &AppState,
    flow_id: &str,
    initial: StateMap,
) -> Result<RunReport, StatusCode> {
    let entry = state.catalog.get(flow_id).ok_or_else(|| {
        tracing::warn!("❌ Run requested for unknown flow: {}", flow_id);
        StatusCode::NOT_FOUND
    })?;

    let engine = entry.build(&state.config.engine).map_err(|e| {
        tracing::error!("❌ Failed to build flow '{}': {}", flow_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let run_start = std::time::Instant::now();

    match engine.run(initial, state.config.engine.max_steps).await {
        Ok(report) => {
            tracing::info!(
                "🎉 Flow '{}' finished in {} step(s), {:?}{}",
                flow_id,
                report.steps,
                run_start.elapsed(),
                if report.truncated { " (truncated by step budget)" } else { "" }
            );
            Ok(report)
        }
        Err(e) => {
            tracing::error!(
                "❌ Flow '{}' failed after {:?} - Error: {}",
                flow_id,
                run_start.elapsed(),
                e
            );

            // Log the error chain for debugging
            let error_chain: Vec<String> = std::iter::successors(
                Some(&e as &dyn std::error::Error),
                |err| err.source(),
            )
            .skip(1)
            .map(|err| err.to_string())
            .collect();

            if !error_chain.is_empty() {
                tracing::debug!("🔍 Error chain: {}", error_chain.join(" → "));
            }

            // 422 for task failures vs 500 for wiring faults
            Err(match e {
                EngineError::TaskFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            })
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
