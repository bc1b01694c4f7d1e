use serde::{Deserialize, Serialize};

use crate::services::cors::{AuthorizationDecision, Environment, PatternCategory};

#[derive(Debug, Deserialize)]
pub struct CheckOriginQuery {
    pub origin: Option<String>,
    #[serde(default)]
    pub credentialed: bool,
}

#[derive(Debug, Serialize)]
pub struct CheckOriginResponse {
    pub origin: String,
    pub environment: Environment,
    pub credentialed: bool,
    /// Pattern family the origin belongs to when no pattern rule is active for it here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive_category: Option<PatternCategory>,
    #[serde(flatten)]
    pub decision: AuthorizationDecision,
}
