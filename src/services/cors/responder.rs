//! Turns an [`AuthorizationDecision`] into the CORS response header set.
//!
//! Rejected origins get no CORS headers at all. Allowed origins are echoed literally;
//! `*` is only emitted on an actual response for a wildcard match that is not credentialed
//! while credentials are not advertised. Preflights always echo the origin because the
//! browser does not say whether the follow-up request will carry cookies.

use axum::http::{HeaderMap, HeaderValue, header};

use crate::services::cors::authorizer::{AuthorizationDecision, MatchedVia};

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS, PATCH, HEAD";

pub const ALLOWED_HEADERS: &str = "Authorization, Content-Type, Accept, Origin, X-Requested-With, \
     X-Request-ID, X-Trace-ID, X-Service-Name, X-Service-ID, X-Cross-Service-Auth";

pub const EXPOSED_HEADERS: &str = "X-Request-ID, X-Trace-ID, Content-Length, Content-Type";

pub const DEFAULT_MAX_AGE_SECONDS: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Preflight,
    Actual,
}

#[derive(Debug, Clone)]
pub struct PreflightResponder {
    advertise_credentials: bool,
    max_age: HeaderValue,
}

impl Default for PreflightResponder {
    fn default() -> Self {
        Self::new(true, DEFAULT_MAX_AGE_SECONDS)
    }
}

impl PreflightResponder {
    pub fn new(advertise_credentials: bool, max_age_seconds: u64) -> Self {
        Self {
            advertise_credentials,
            max_age: HeaderValue::from(max_age_seconds),
        }
    }

    pub fn advertises_credentials(&self) -> bool {
        self.advertise_credentials
    }

    /// Header set for one response. Empty when the origin was rejected.
    pub fn headers(
        &self,
        decision: &AuthorizationDecision,
        origin: &str,
        credentialed: bool,
        kind: RequestKind,
    ) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if !decision.allowed {
            return headers;
        }

        let with_credentials = credentialed || self.advertise_credentials;
        let star = decision.matched_via == MatchedVia::Wildcard
            && !with_credentials
            && kind == RequestKind::Actual;
        let allow_origin = if star {
            HeaderValue::from_static("*")
        } else {
            match HeaderValue::from_str(origin) {
                Ok(v) => v,
                Err(_) => {
                    tracing::debug!("origin is not a valid header value, omitting CORS headers");
                    return headers;
                }
            }
        };

        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
        if with_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static(EXPOSED_HEADERS),
        );
        if kind == RequestKind::Preflight {
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        }
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));

        headers
    }

    /// Merge a header set produced by [`Self::headers`] into a downstream response.
    ///
    /// `Vary` is appended so existing values from the handler are kept.
    pub fn merge_into(cors: HeaderMap, target: &mut HeaderMap) {
        for (name, value) in cors {
            let Some(name) = name else { continue };
            if name == header::VARY {
                target.append(name, value);
            } else {
                target.insert(name, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(via: MatchedVia) -> AuthorizationDecision {
        AuthorizationDecision {
            allowed: true,
            matched_via: via,
            matched_rule_id: None,
            category: None,
        }
    }

    #[test]
    fn rejected_origin_gets_no_headers() {
        let responder = PreflightResponder::default();
        let headers = responder.headers(
            &AuthorizationDecision::deny(),
            "https://malicious.com",
            true,
            RequestKind::Preflight,
        );
        assert!(headers.is_empty());
    }

    #[test]
    fn preflight_carries_full_set() {
        let responder = PreflightResponder::default();
        let headers = responder.headers(
            &allowed(MatchedVia::Static),
            "https://app.netrasystems.ai",
            true,
            RequestKind::Preflight,
        );

        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.netrasystems.ai"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOWED_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "3600");
        assert_eq!(headers[header::VARY], "Origin");
        assert!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
                .to_str()
                .unwrap()
                .contains("Authorization")
        );
    }

    #[test]
    fn actual_response_omits_max_age() {
        let responder = PreflightResponder::default();
        let headers = responder.headers(
            &allowed(MatchedVia::Pattern),
            "http://localhost:5173",
            false,
            RequestKind::Actual,
        );
        assert!(headers.get(header::ACCESS_CONTROL_MAX_AGE).is_none());
        assert_eq!(headers[header::ACCESS_CONTROL_EXPOSE_HEADERS], EXPOSED_HEADERS);
    }

    #[test]
    fn credentialed_wildcard_echoes_literal_origin() {
        for advertise in [true, false] {
            let responder = PreflightResponder::new(advertise, 600);
            let headers = responder.headers(
                &allowed(MatchedVia::Wildcard),
                "https://anything.example",
                true,
                RequestKind::Actual,
            );
            assert_eq!(
                headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
                "https://anything.example"
            );
        }
    }

    #[test]
    fn anonymous_wildcard_without_advertised_credentials_uses_star() {
        let responder = PreflightResponder::new(false, 600);
        let headers = responder.headers(
            &allowed(MatchedVia::Wildcard),
            "https://anything.example",
            false,
            RequestKind::Actual,
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }

    #[test]
    fn wildcard_preflight_always_echoes_origin() {
        let responder = PreflightResponder::new(false, 600);
        let headers = responder.headers(
            &allowed(MatchedVia::Wildcard),
            "https://anything.example",
            false,
            RequestKind::Preflight,
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://anything.example"
        );
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "600");
    }

    #[test]
    fn merge_appends_vary() {
        let responder = PreflightResponder::default();
        let cors = responder.headers(
            &allowed(MatchedVia::Static),
            "https://app.netrasystems.ai",
            false,
            RequestKind::Actual,
        );

        let mut target = HeaderMap::new();
        target.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));
        PreflightResponder::merge_into(cors, &mut target);

        let vary: Vec<_> = target.get_all(header::VARY).iter().collect();
        assert_eq!(vary.len(), 2);
        assert_eq!(
            target[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.netrasystems.ai"
        );
    }
}
