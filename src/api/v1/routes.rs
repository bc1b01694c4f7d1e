/*
 * Responsibility
 * - URL structure of v1
 * - /health and the CORS diagnostics (/cors/stats, /cors/check)
 * - CORS itself is applied at the top-level Router, not here
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::{
    cors::{check_origin, stats},
    health::health,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/cors/stats", get(stats))
        .route("/cors/check", get(check_origin))
}
