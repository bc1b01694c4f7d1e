pub mod authorizer;
pub mod environment;
pub mod patterns;
pub mod recorder;
pub mod responder;

pub use authorizer::{
    AuthorizationContext, AuthorizationDecision, MatchedVia, OriginAuthorizer, evaluate,
};
pub use environment::{Environment, EnvironmentPolicy};
pub use patterns::{PatternCategory, PatternError, PatternRuleSet};
pub use recorder::RejectionRecorder;
pub use responder::{PreflightResponder, RequestKind};
