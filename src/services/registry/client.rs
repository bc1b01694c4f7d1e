//! Service registry client interface used by the dynamic origin source.
use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry-layer errors (transport/command).
///
/// Note:
/// - These never reach the authorization decision. The refresher logs them and keeps
///   the previous snapshot.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry connection error: {0}")]
    BackendConnection(String),
    #[error("registry command error: {0}")]
    BackendCommand(String),
}

/// Read side of the service registry.
///
/// Implementations must be cheap to clone (typically `Arc<...>` inside).
#[async_trait]
pub trait RegistryClient: Clone + Send + Sync + 'static {
    // Returns the registry backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Origins of currently registered services.
    async fn registered_origins(&self) -> RegistryResult<HashSet<String>>;
}
