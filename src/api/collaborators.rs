use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::post, Json, Router};
use serde_json::Value;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{require_permission, CurrentUser};
use crate::core::state::AppState;
use crate::services::collaborators::{
    is_valid_simulation_name, CollaboratorError, UpstreamResponse,
};
use crate::services::permissions::Permission;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/chat", post(ai_chat))
        .route("/sim/:simulation", post(run_simulation))
}

async fn ai_chat(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<Response, ApiError> {
    let caller = require_permission(&user, Permission::AiUse)?;

    let upstream = state
        .collaborators()
        .ai_chat(&payload)
        .await
        .map_err(|e| upstream_error(e, "ai"))?;

    tracing::info!(user_id = %caller.id, status = upstream.status, action = "ai_chat", "AI chat relayed");
    Ok(relay(upstream))
}

async fn run_simulation(
    Path(simulation): Path<String>,
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<Response, ApiError> {
    let caller = require_permission(&user, Permission::SimUse)?;

    if !is_valid_simulation_name(&simulation) {
        return Err(ApiError::BadRequest(format!("Unknown simulation '{simulation}'")));
    }

    let upstream = state
        .collaborators()
        .simulate(&simulation, &payload)
        .await
        .map_err(|e| upstream_error(e, "sim"))?;

    tracing::info!(
        user_id = %caller.id,
        simulation = %simulation,
        status = upstream.status,
        action = "simulation_run",
        "Simulation relayed"
    );
    Ok(relay(upstream))
}

/// Upstream statuses pass through unchanged, including errors.
fn relay(upstream: UpstreamResponse) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(upstream.body)).into_response()
}

fn upstream_error(error: CollaboratorError, service: &'static str) -> ApiError {
    tracing::warn!(error = %error, service, "Collaborator call failed");
    match error {
        CollaboratorError::NotConfigured(_) => {
            ApiError::ServiceUnavailable(format!("{service} service is not configured"))
        }
        CollaboratorError::Transport(_) => {
            ApiError::ServiceUnavailable(format!("{service} service is unreachable"))
        }
        CollaboratorError::TooLarge { .. } | CollaboratorError::InvalidBody => {
            ApiError::ServiceUnavailable(format!("{service} service returned an unusable response"))
        }
    }
}
