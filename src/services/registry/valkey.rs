use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::services::registry::client::{RegistryClient, RegistryError, RegistryResult};

/// Valkey/Redis-backed service registry.
///
/// Registered service origins are members of a single set (`SMEMBERS <key>`).
/// The connection is established lazily on first refresh, so an unreachable registry
/// at startup only means "no dynamic origins yet".
#[derive(Clone, Debug)]
pub struct ValkeyRegistryClient {
    client: redis::Client,
    manager: Arc<OnceCell<redis::aio::ConnectionManager>>,
    key: String,
}

impl ValkeyRegistryClient {
    // Create a registry client from a URL like `redis://localhost:6379`
    pub fn new(url: &str, key: impl Into<String>) -> Result<Self, RegistryError> {
        let client =
            redis::Client::open(url).map_err(|e| RegistryError::BackendConnection(e.to_string()))?;

        Ok(Self {
            client,
            manager: Arc::new(OnceCell::new()),
            key: key.into(),
        })
    }

    async fn connection(&self) -> RegistryResult<redis::aio::ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                self.client
                    .get_connection_manager()
                    .await
                    .map_err(|e| RegistryError::BackendConnection(e.to_string()))
            })
            .await?;

        // Use a clone of the connection manager
        Ok(manager.clone())
    }
}

#[async_trait]
impl RegistryClient for ValkeyRegistryClient {
    fn backend_name(&self) -> &'static str {
        "valkey"
    }

    async fn registered_origins(&self) -> RegistryResult<HashSet<String>> {
        let mut conn = self.connection().await?;

        let members: HashSet<String> = redis::cmd("SMEMBERS")
            .arg(&self.key)
            .query_async(&mut conn)
            .await
            .map_err(|e| RegistryError::BackendCommand(e.to_string()))?;

        Ok(members)
    }
}
