/*
 * Responsibility
 * - Read environment variables once at startup (APP_ENV, CORS allow list, pattern inputs, registry)
 * - Validate values (startup fails on malformed numbers / booleans)
 * - Never re-read per request: the CORS engine receives values built from this struct
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::services::cors::Environment;

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Inputs used to compile the pattern rule table.
#[derive(Clone, Debug)]
pub struct PatternConfig {
    pub root_domain: String,
    pub cloud_run_services: Vec<String>,
    pub cloud_run_region_codes: Vec<String>,
    pub cloud_run_regions: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            root_domain: "netrasystems.ai".to_string(),
            cloud_run_services: split_list("netra-backend,netra-frontend,netra-auth"),
            cloud_run_region_codes: split_list("uc,ue,uw,ew"),
            cloud_run_regions: split_list("us-central1,us-east1,us-west1,europe-west1"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RegistryConfig {
    pub url: String,
    pub key: String,
    pub refresh_interval: Duration,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: Environment,

    // `None` means "use the environment defaults".
    pub cors_allowed_origins: Option<Vec<String>>,
    /// When false, `Access-Control-Allow-Credentials` is only sent to requests that visibly
    /// carry credentials. Cookies are never listed in `Access-Control-Request-Headers`, so a
    /// cookie-bearing request that needs a preflight is blocked by the browser in that mode.
    pub cors_advertise_credentials: bool,
    pub cors_max_age_seconds: u64,
    pub patterns: PatternConfig,

    pub registry: Option<RegistryConfig>,

    pub http_body_limit_bytes: usize,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a closure over a fixed map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = Environment::parse(lookup("APP_ENV").as_deref());

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS").map(|raw| split_list(&raw));

        let cors_advertise_credentials = match lookup("CORS_ADVERTISE_CREDENTIALS") {
            None => true,
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid("CORS_ADVERTISE_CREDENTIALS"))?,
        };
        let cors_max_age_seconds = parse_or(&lookup, "CORS_MAX_AGE_SECONDS", 3600)?;

        let defaults = PatternConfig::default();
        let patterns = PatternConfig {
            root_domain: lookup("CORS_ROOT_DOMAIN")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.root_domain),
            cloud_run_services: lookup("CORS_CLOUD_RUN_SERVICES")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.cloud_run_services),
            cloud_run_region_codes: lookup("CORS_CLOUD_RUN_REGION_CODES")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.cloud_run_region_codes),
            cloud_run_regions: lookup("CORS_CLOUD_RUN_REGIONS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.cloud_run_regions),
        };

        let registry = match lookup("SERVICE_REGISTRY_URL").filter(|s| !s.trim().is_empty()) {
            None => None,
            Some(url) => {
                let refresh_secs: u64 = parse_or(&lookup, "SERVICE_REGISTRY_REFRESH_SECONDS", 30)?;
                let timeout_ms: u64 = parse_or(&lookup, "SERVICE_REGISTRY_TIMEOUT_MS", 500)?;
                Some(RegistryConfig {
                    url,
                    key: lookup("SERVICE_REGISTRY_KEY")
                        .unwrap_or_else(|| "service-registry:origins".to_string()),
                    refresh_interval: Duration::from_secs(refresh_secs.max(1)),
                    timeout: Duration::from_millis(timeout_ms.max(1)),
                })
            }
        };

        let http_body_limit_bytes = parse_or(&lookup, "HTTP_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let http_timeout_seconds: u64 = parse_or(&lookup, "HTTP_TIMEOUT_SECONDS", 30)?;

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            cors_advertise_credentials,
            cors_max_age_seconds,
            patterns,
            registry,
            http_body_limit_bytes,
            http_timeout: Duration::from_secs(http_timeout_seconds),
        })
    }
}

/// Split a comma-separated list, trimming whitespace and dropping empty entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_fail_closed_to_production() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.app_env, Environment::Production);
        assert_eq!(config.addr.port(), 3000);
        assert!(config.cors_allowed_origins.is_none());
        assert!(config.cors_advertise_credentials);
        assert_eq!(config.cors_max_age_seconds, 3600);
        assert_eq!(config.patterns.root_domain, "netrasystems.ai");
        assert!(config.registry.is_none());
    }

    #[test]
    fn explicit_origin_list_is_split_and_trimmed() {
        let config = Config::from_lookup(lookup_from(&[(
            "CORS_ALLOWED_ORIGINS",
            " https://a.example , ,https://b.example,",
        )]))
        .unwrap();

        assert_eq!(
            config.cors_allowed_origins,
            Some(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );
    }

    #[test]
    fn registry_is_configured_only_with_url() {
        let config = Config::from_lookup(lookup_from(&[
            ("SERVICE_REGISTRY_URL", "redis://localhost:6379"),
            ("SERVICE_REGISTRY_REFRESH_SECONDS", "0"),
        ]))
        .unwrap();

        let registry = config.registry.unwrap();
        assert_eq!(registry.key, "service-registry:origins");
        assert_eq!(registry.refresh_interval, Duration::from_secs(1));
        assert_eq!(registry.timeout, Duration::from_millis(500));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "http")])).unwrap_err();
        assert_eq!(err, ConfigError::Invalid("PORT"));

        let err = Config::from_lookup(lookup_from(&[("CORS_ADVERTISE_CREDENTIALS", "maybe")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("CORS_ADVERTISE_CREDENTIALS"));
    }
}
