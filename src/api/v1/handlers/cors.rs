/*
 * Responsibility
 * - GET /cors/stats: RejectionRecorder snapshot (observability only)
 * - GET /cors/check: dry-run decision for an origin in the running environment (not recorded),
 *   plus the pattern family it would fall into where that family is disabled
 */
use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::v1::dto::cors::{CheckOriginQuery, CheckOriginResponse};
use crate::error::AppError;
use crate::services::cors::MatchedVia;
use crate::services::cors::recorder::RecorderSnapshot;
use crate::state::AppState;

pub async fn stats(State(state): State<AppState>) -> Json<RecorderSnapshot> {
    Json(state.recorder.snapshot())
}

pub async fn check_origin(
    State(state): State<AppState>,
    Query(query): Query<CheckOriginQuery>,
) -> Result<Json<CheckOriginResponse>, AppError> {
    let origin = query.origin.filter(|o| !o.is_empty()).ok_or_else(|| {
        AppError::bad_request("MISSING_ORIGIN", "origin query parameter is required")
    })?;

    let decision = state
        .authorizer
        .decide(Some(origin.as_str()), query.credentialed);
    let inactive_category = match decision.matched_via {
        MatchedVia::Pattern => None,
        _ => state.authorizer.rules().classify(&origin),
    };

    Ok(Json(CheckOriginResponse {
        environment: state.authorizer.policy().environment(),
        credentialed: query.credentialed,
        inactive_category,
        origin,
        decision,
    }))
}
