//! Compiled regex rules for origin families (localhost, staging subdomains, Cloud Run).
//!
//! The table is compiled once from [`PatternConfig`] and is read-only afterwards.
//! Rules are evaluated in table order and the first active match wins:
//! `localhost` → `staging_subdomain` → `cloud_run`.

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::config::PatternConfig;
use crate::services::cors::Environment;

/// Origins longer than this are never matched.
pub const MAX_ORIGIN_LEN: usize = 2048;

const NON_PRODUCTION: &[Environment] = &[Environment::Development, Environment::Staging];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    Localhost,
    StagingSubdomain,
    CloudRun,
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid origin pattern `{id}`: {source}")]
    Invalid {
        id: &'static str,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    id: &'static str,
    category: PatternCategory,
    regex: Regex,
    active_environments: &'static [Environment],
}

impl PatternRule {
    fn compile(
        id: &'static str,
        category: PatternCategory,
        pattern: &str,
        active_environments: &'static [Environment],
    ) -> Result<Self, PatternError> {
        let regex = Regex::new(pattern).map_err(|source| PatternError::Invalid { id, source })?;
        Ok(Self {
            id,
            category,
            regex,
            active_environments,
        })
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn category(&self) -> PatternCategory {
        self.category
    }

    pub fn is_active_in(&self, environment: Environment) -> bool {
        self.active_environments.contains(&environment)
    }
}

#[derive(Debug, Clone)]
pub struct PatternRuleSet {
    rules: Vec<PatternRule>,
}

impl PatternRuleSet {
    pub fn compile(config: &PatternConfig) -> Result<Self, PatternError> {
        let mut rules = vec![
            PatternRule::compile(
                "localhost",
                PatternCategory::Localhost,
                r"^https?://(?:localhost|127\.0\.0\.1|0\.0\.0\.0|\[::1\])(?::[0-9]+)?$",
                NON_PRODUCTION,
            )?,
            PatternRule::compile(
                "staging_subdomain",
                PatternCategory::StagingSubdomain,
                &format!(
                    r"^https://[a-zA-Z0-9-]+\.staging\.{}$",
                    regex::escape(&config.root_domain)
                ),
                NON_PRODUCTION,
            )?,
        ];

        // Empty alternations would match nothing useful; skip those rules instead.
        if !config.cloud_run_services.is_empty() && !config.cloud_run_region_codes.is_empty() {
            rules.push(PatternRule::compile(
                "cloud_run.named_service",
                PatternCategory::CloudRun,
                &format!(
                    r"^https://(?:{})(?:-staging)?-[a-z0-9]+-(?:{})\.a\.run\.app$",
                    alternation(&config.cloud_run_services),
                    alternation(&config.cloud_run_region_codes)
                ),
                NON_PRODUCTION,
            )?);
        }
        if !config.cloud_run_regions.is_empty() {
            rules.push(PatternRule::compile(
                "cloud_run.regional",
                PatternCategory::CloudRun,
                &format!(
                    r"^https://[a-z0-9-]+-[0-9]+\.(?:{})\.run\.app$",
                    alternation(&config.cloud_run_regions)
                ),
                NON_PRODUCTION,
            )?);
        }
        rules.push(PatternRule::compile(
            "cloud_run",
            PatternCategory::CloudRun,
            r"^https://[a-z0-9-]+-[a-z0-9]+-[a-z]{2,4}\.a\.run\.app$",
            NON_PRODUCTION,
        )?);

        Ok(Self { rules })
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id).collect()
    }

    /// First rule active in `environment` that matches `origin`.
    ///
    /// Malformed input (control characters, oversize) is a non-match.
    pub fn matches(&self, origin: &str, environment: Environment) -> Option<&PatternRule> {
        if !is_well_formed(origin) {
            tracing::debug!(len = origin.len(), "malformed origin skipped by pattern rules");
            return None;
        }

        self.rules
            .iter()
            .filter(|rule| rule.is_active_in(environment))
            .find(|rule| rule.regex.is_match(origin))
    }

    /// Category of the first matching rule, ignoring environment scoping.
    pub fn classify(&self, origin: &str) -> Option<PatternCategory> {
        if !is_well_formed(origin) {
            return None;
        }
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(origin))
            .map(|rule| rule.category)
    }
}

pub(crate) fn is_well_formed(origin: &str) -> bool {
    !origin.is_empty() && origin.len() <= MAX_ORIGIN_LEN && !origin.chars().any(char::is_control)
}

fn alternation(values: &[String]) -> String {
    values
        .iter()
        .map(|v| regex::escape(v))
        .collect::<Vec<_>>()
        .join("|")
}
