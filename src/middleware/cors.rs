//! CORS enforcement for browser clients.
//!
//! Note:
//! - CORS is enforced by browsers. Native mobile apps and server-to-server calls are not
//!   restricted by CORS, so requests without an `Origin` header pass through untouched.
//! - This middleware should be applied at the Router level (not inside handlers) so that
//!   preflights to any path are answered here.
//!
//! Flow per request:
//! - `OriginAuthorizer::decide` → `RejectionRecorder::record` → `PreflightResponder::headers`
//! - Preflight (`OPTIONS` + `Access-Control-Request-Method`) is answered directly:
//!   200 with CORS headers when allowed, 403 without CORS headers when rejected.
//! - Other requests run the handler, then get the CORS headers merged in.
//! - Any response to a request with an `Origin` header carries `Vary: Origin`, rejected ones
//!   included, so shared caches key on the origin.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::services::cors::{PreflightResponder, RequestKind};
use crate::state::AppState;

/// Recorder key for `Origin` values that are not visible ASCII.
const MALFORMED_ORIGIN: &str = "<malformed>";

/// Apply the CORS middleware to the given Router.
pub fn apply(router: Router, state: AppState) -> Router {
    router.layer(middleware::from_fn_with_state(state, cors_middleware))
}

async fn cors_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !req.headers().contains_key(header::ORIGIN) {
        return next.run(req).await;
    }
    // Non-visible-ASCII origins are malformed: decided as "no origin" and therefore denied.
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let kind = if is_preflight(&req) {
        RequestKind::Preflight
    } else {
        RequestKind::Actual
    };
    let credentialed = match kind {
        RequestKind::Preflight => {
            requests_credentials(req.headers()) || state.responder.advertises_credentials()
        }
        RequestKind::Actual => carries_credentials(req.headers()),
    };

    let decision = state.authorizer.decide(origin.as_deref(), credentialed);
    state
        .recorder
        .record(origin.as_deref().unwrap_or(MALFORMED_ORIGIN), decision.allowed);

    let mut cors_headers = match origin.as_deref() {
        Some(o) => state.responder.headers(&decision, o, credentialed, kind),
        None => HeaderMap::new(),
    };
    if !cors_headers.contains_key(header::VARY) {
        cors_headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    }

    let mut response = match kind {
        RequestKind::Preflight => {
            let status = if decision.allowed {
                StatusCode::OK
            } else {
                StatusCode::FORBIDDEN
            };
            status.into_response()
        }
        RequestKind::Actual => next.run(req).await,
    };

    PreflightResponder::merge_into(cors_headers, response.headers_mut());
    response
}

fn is_preflight<B>(req: &Request<B>) -> bool {
    req.method() == Method::OPTIONS
        && req
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

// Cookies or an Authorization header make the actual request credentialed.
fn carries_credentials(headers: &HeaderMap) -> bool {
    headers.contains_key(header::COOKIE) || headers.contains_key(header::AUTHORIZATION)
}

// Browsers strip credentials from preflights; look at what the actual request will send.
fn requests_credentials(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|h| {
            let h = h.trim();
            h.eq_ignore_ascii_case("authorization") || h.eq_ignore_ascii_case("cookie")
        })
}
