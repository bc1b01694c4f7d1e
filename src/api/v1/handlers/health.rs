/*
 * Responsibility
 * - GET /health (liveness + which CORS policy this process runs)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let policy = state.authorizer.policy();
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "environment": policy.environment(),
            "wildcard_enabled": policy.wildcard_enabled(),
        })),
    )
}
