//! Process-wide environment and the static origin allow list for it.
//!
//! Both are resolved once at startup and never change afterwards.

use std::fmt;

use serde::Serialize;

/// Literal token meaning "any origin".
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Resolve an environment identifier.
    ///
    /// Unknown or missing identifiers resolve to `Production` so that a typo
    /// in deployment config can never widen the policy.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("development" | "dev" | "local") => Self::Development,
            Some("staging" | "stage") => Self::Staging,
            Some("production" | "prod") => Self::Production,
            other => {
                if let Some(value) = other {
                    tracing::warn!(
                        app_env = %value,
                        "unknown environment, using production policy"
                    );
                }
                Self::Production
            }
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of `{environment, static_allow_list, wildcard_enabled}`.
#[derive(Debug, Clone)]
pub struct EnvironmentPolicy {
    environment: Environment,
    static_allow_list: Vec<String>,
    wildcard_enabled: bool,
}

impl EnvironmentPolicy {
    /// Build the policy for `environment`.
    ///
    /// An explicit list is used verbatim; otherwise the environment defaults
    /// derived from `root_domain` apply.
    pub fn new(
        environment: Environment,
        explicit: Option<Vec<String>>,
        root_domain: &str,
    ) -> Self {
        let static_allow_list = match explicit {
            Some(list) => {
                warn_unparseable(&list);
                dedup_preserving_order(list)
            }
            None => default_origins(environment, root_domain),
        };

        let wildcard_enabled =
            !environment.is_production() && static_allow_list.iter().any(|o| o == WILDCARD);

        Self {
            environment,
            static_allow_list,
            wildcard_enabled,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn static_allow_list(&self) -> &[String] {
        &self.static_allow_list
    }

    /// Whether the wildcard token is effective. Always false in production.
    pub fn wildcard_enabled(&self) -> bool {
        self.wildcard_enabled
    }
}

const LOCALHOST_PORTS: [u16; 6] = [3000, 3001, 5173, 8000, 8080, 8081];

fn localhost_range() -> Vec<String> {
    let mut origins = Vec::with_capacity(LOCALHOST_PORTS.len() * 2);
    for host in ["localhost", "127.0.0.1"] {
        for port in LOCALHOST_PORTS {
            origins.push(format!("http://{host}:{port}"));
        }
    }
    origins
}

fn default_origins(environment: Environment, root_domain: &str) -> Vec<String> {
    match environment {
        Environment::Production => ["", "www.", "app.", "api.", "auth."]
            .iter()
            .map(|sub| format!("https://{sub}{root_domain}"))
            .collect(),
        Environment::Staging => {
            let mut origins: Vec<String> = ["", "app.", "api.", "auth."]
                .iter()
                .map(|sub| format!("https://{sub}staging.{root_domain}"))
                .collect();
            origins.extend(
                ["netra-frontend-staging", "netra-backend-staging", "netra-auth-staging"]
                    .iter()
                    .map(|svc| format!("https://{svc}.{root_domain}")),
            );
            origins.extend(localhost_range());
            origins.push(WILDCARD.to_string());
            origins
        }
        Environment::Development => {
            let mut origins = localhost_range();
            origins.push(WILDCARD.to_string());
            origins
        }
    }
}

fn dedup_preserving_order(list: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(list.len());
    for origin in list {
        if !out.contains(&origin) {
            out.push(origin);
        }
    }
    out
}

// Matching is exact string comparison; parsing here only surfaces likely typos.
fn warn_unparseable(list: &[String]) {
    for origin in list.iter().filter(|o| o.as_str() != WILDCARD) {
        let ok = url::Url::parse(origin)
            .map(|u| u.host_str().is_some() && !origin.ends_with('/'))
            .unwrap_or(false);
        if !ok {
            tracing::warn!(
                origin = %origin,
                "configured CORS origin is not of the form scheme://host[:port]"
            );
        }
    }
}
