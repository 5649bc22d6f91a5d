//! HTTP boundary for plan generation
//!
//! Exposes a single planning endpoint plus a health probe. The caller
//! identity for usage gating comes from the `x-caller-id` header; requests
//! without one are treated as anonymous. Error bodies carry a single
//! `error` string, with the status chosen from the error taxonomy.

use crate::config::Config;
use crate::error::{ExamplanError, Result};
use crate::gate::create_gate;
use crate::planner::Planner;
use crate::proposers::create_proposer;
use crate::types::StudySession;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Successful plan response body
#[derive(Debug, Serialize, Deserialize)]
pub struct PlanResponse {
    pub sessions: Vec<StudySession>,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

struct AppState {
    planner: Planner,
}

/// Build the application router around a planner
pub fn router(planner: Planner) -> Router {
    let state = Arc::new(AppState { planner });
    Router::new()
        .route("/v1/study-plans", post(generate_plan))
        .route("/healthz", get(health))
        .with_state(state)
}

/// Run the HTTP server per configuration until shutdown
///
/// # Errors
///
/// Returns an error if the planner cannot be constructed or the bind
/// address is unavailable.
pub async fn serve(config: &Config) -> Result<()> {
    let gate = create_gate(&config.gate)?;
    let proposer = create_proposer(&config.proposer)?;
    let app = router(Planner::new(gate, proposer));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn generate_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<crate::types::PlanRequestBody>,
) -> Response {
    let caller = headers
        .get("x-caller-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or("anonymous");

    match state.planner.generate(caller, &body).await {
        Ok(sessions) => (StatusCode::OK, Json(PlanResponse { sessions })).into_response(),
        Err(err) => {
            let status = error_status(&err);
            if status.is_server_error() {
                tracing::error!("Plan generation failed: {:#}", err);
            } else {
                tracing::warn!("Plan generation rejected: {}", err);
            }
            (
                status,
                Json(ErrorBody {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Map an error to the HTTP status the contract specifies
fn error_status(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<ExamplanError>() {
        Some(ExamplanError::Validation(_)) => StatusCode::BAD_REQUEST,
        Some(ExamplanError::FeatureGated(_)) => StatusCode::PAYMENT_REQUIRED,
        Some(ExamplanError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
        Some(ExamplanError::UpstreamUnavailable(_)) | Some(ExamplanError::MalformedUpstream(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
