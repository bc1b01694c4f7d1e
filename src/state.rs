/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 *   - authorizer: OriginAuthorizer, responder: PreflightResponder, recorder: RejectionRecorder
 * - Cheap to Clone (everything behind Arc); all members are read-only or atomic
 */
use std::sync::Arc;

use crate::services::cors::{OriginAuthorizer, PreflightResponder, RejectionRecorder};

#[derive(Clone, Debug)]
pub struct AppState {
    pub authorizer: Arc<OriginAuthorizer>,
    pub responder: Arc<PreflightResponder>,
    pub recorder: Arc<RejectionRecorder>,
}

impl AppState {
    pub fn new(
        authorizer: Arc<OriginAuthorizer>,
        responder: Arc<PreflightResponder>,
        recorder: Arc<RejectionRecorder>,
    ) -> Self {
        Self {
            authorizer,
            responder,
            recorder,
        }
    }
}
