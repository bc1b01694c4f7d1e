//! Origin authorization decision.
//!
//! [`evaluate`] is a pure function of [`AuthorizationContext`]. Evaluation order is fixed
//! and the first matching step wins:
//!
//! 1. missing / empty / malformed origin → deny
//! 2. pattern rule active in the current environment
//! 3. exact member of the static allow list
//! 4. member of the dynamic (service registry) origin set
//! 5. wildcard token in the static list, outside production
//! 6. deny
//!
//! Patterns go first so permissive development/staging families are not shadowed by
//! a narrower explicit list.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::services::cors::environment::WILDCARD;
use crate::services::cors::patterns::{PatternCategory, PatternRuleSet, is_well_formed};
use crate::services::cors::{Environment, EnvironmentPolicy};
use crate::services::registry::DynamicOriginSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchedVia {
    Pattern,
    Static,
    Wildcard,
    Dynamic,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    pub matched_via: MatchedVia,
    pub matched_rule_id: Option<&'static str>,
    pub category: Option<PatternCategory>,
}

impl AuthorizationDecision {
    pub fn deny() -> Self {
        Self {
            allowed: false,
            matched_via: MatchedVia::None,
            matched_rule_id: None,
            category: None,
        }
    }

    fn allow(matched_via: MatchedVia) -> Self {
        Self {
            allowed: true,
            matched_via,
            matched_rule_id: None,
            category: None,
        }
    }
}

/// Inputs to one decision.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationContext<'a> {
    pub origin: Option<&'a str>,
    pub environment: Environment,
    pub credentialed: bool,
    pub static_allow_list: &'a [String],
    pub pattern_rules: &'a PatternRuleSet,
    pub dynamic_origins: Option<&'a HashSet<String>>,
}

pub fn evaluate(ctx: &AuthorizationContext<'_>) -> AuthorizationDecision {
    let origin = match ctx.origin {
        Some(o) if o != WILDCARD && is_well_formed(o) => o,
        _ => return AuthorizationDecision::deny(),
    };

    if let Some(rule) = ctx.pattern_rules.matches(origin, ctx.environment) {
        return AuthorizationDecision {
            matched_rule_id: Some(rule.id()),
            category: Some(rule.category()),
            ..AuthorizationDecision::allow(MatchedVia::Pattern)
        };
    }

    if ctx.static_allow_list.iter().any(|o| o == origin) {
        return AuthorizationDecision::allow(MatchedVia::Static);
    }

    if ctx.dynamic_origins.is_some_and(|set| set.contains(origin)) {
        return AuthorizationDecision::allow(MatchedVia::Dynamic);
    }

    if !ctx.environment.is_production() && ctx.static_allow_list.iter().any(|o| o == WILDCARD) {
        return AuthorizationDecision::allow(MatchedVia::Wildcard);
    }

    AuthorizationDecision::deny()
}

/// Process-wide authorizer: the startup policy, the compiled rule table and an
/// optional dynamic origin source.
pub struct OriginAuthorizer {
    policy: EnvironmentPolicy,
    rules: PatternRuleSet,
    dynamic: Option<Arc<dyn DynamicOriginSource>>,
}

impl OriginAuthorizer {
    pub fn new(
        policy: EnvironmentPolicy,
        rules: PatternRuleSet,
        dynamic: Option<Arc<dyn DynamicOriginSource>>,
    ) -> Self {
        Self {
            policy,
            rules,
            dynamic,
        }
    }

    pub fn policy(&self) -> &EnvironmentPolicy {
        &self.policy
    }

    pub fn rules(&self) -> &PatternRuleSet {
        &self.rules
    }

    pub fn decide(&self, origin: Option<&str>, credentialed: bool) -> AuthorizationDecision {
        let snapshot = self.dynamic.as_ref().map(|source| source.known_origins());

        let decision = evaluate(&AuthorizationContext {
            origin,
            environment: self.policy.environment(),
            credentialed,
            static_allow_list: self.policy.static_allow_list(),
            pattern_rules: &self.rules,
            dynamic_origins: snapshot.as_deref(),
        });

        if !decision.allowed {
            tracing::debug!(
                origin = origin.unwrap_or_default(),
                credentialed,
                environment = %self.policy.environment(),
                "origin rejected"
            );
        }
        decision
    }
}

impl std::fmt::Debug for OriginAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginAuthorizer")
            .field("policy", &self.policy)
            .field("rules", &self.rules.rule_ids())
            .field("dynamic", &self.dynamic.is_some())
            .finish()
    }
}
