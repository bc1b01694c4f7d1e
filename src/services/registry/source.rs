//! Dynamic origin sources consulted by the authorizer.
//!
//! Reads are lock-free snapshots (`ArcSwap`); refreshes run out-of-band on a tokio task
//! and are bounded by a timeout. A failed or timed-out refresh keeps the previous set.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::services::cors::environment::WILDCARD;
use crate::services::registry::client::RegistryClient;

/// Supplies currently-registered service origins.
///
/// Must return quickly and never fail; an unavailable backend is an empty set.
pub trait DynamicOriginSource: Send + Sync {
    fn known_origins(&self) -> Arc<HashSet<String>>;
}

/// Fixed set, for tests and deployments that pin their service origins.
#[derive(Debug, Default)]
pub struct StaticOriginSource {
    origins: Arc<HashSet<String>>,
}

impl StaticOriginSource {
    pub fn new(origins: impl IntoIterator<Item = String>) -> Self {
        Self {
            origins: Arc::new(sanitize(origins)),
        }
    }
}

impl DynamicOriginSource for StaticOriginSource {
    fn known_origins(&self) -> Arc<HashSet<String>> {
        Arc::clone(&self.origins)
    }
}

/// Registry-backed source whose snapshot is swapped atomically by a background refresher.
#[derive(Debug, Default)]
pub struct CachedRegistrySource {
    current: ArcSwap<HashSet<String>>,
}

impl DynamicOriginSource for CachedRegistrySource {
    fn known_origins(&self) -> Arc<HashSet<String>> {
        self.current.load_full()
    }
}

impl CachedRegistrySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one refresh against `client`, bounded by `timeout`.
    ///
    /// Returns `true` when the snapshot was replaced.
    pub async fn refresh_once<C: RegistryClient>(&self, client: &C, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, client.registered_origins()).await {
            Ok(Ok(origins)) => {
                let origins = sanitize(origins);
                tracing::debug!(
                    backend = client.backend_name(),
                    count = origins.len(),
                    "service registry origins refreshed"
                );
                self.current.store(Arc::new(origins));
                true
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    backend = client.backend_name(),
                    error = %err,
                    "service registry refresh failed, keeping previous origins"
                );
                false
            }
            Err(_) => {
                tracing::warn!(
                    backend = client.backend_name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "service registry refresh timed out, keeping previous origins"
                );
                false
            }
        }
    }

    /// Refresh immediately, then every `interval`, until the returned task is aborted.
    pub fn spawn_refresher<C: RegistryClient>(
        self: &Arc<Self>,
        client: C,
        interval: Duration,
        timeout: Duration,
    ) -> JoinHandle<()> {
        let source = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                source.refresh_once(&client, timeout).await;
            }
        })
    }
}

// The registry may only contribute concrete origins, never the wildcard token.
fn sanitize(origins: impl IntoIterator<Item = String>) -> HashSet<String> {
    origins
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty() && o != WILDCARD)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::services::registry::client::{RegistryError, RegistryResult};

    #[derive(Clone)]
    struct FakeRegistry {
        responses: Arc<Mutex<Vec<RegistryResult<HashSet<String>>>>>,
        delay: Duration,
    }

    impl FakeRegistry {
        fn new(responses: Vec<RegistryResult<HashSet<String>>>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(responses)),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl RegistryClient for FakeRegistry {
        fn backend_name(&self) -> &'static str {
            "fake"
        }

        async fn registered_origins(&self) -> RegistryResult<HashSet<String>> {
            tokio::time::sleep(self.delay).await;
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(HashSet::new()))
        }
    }

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn static_source_drops_wildcard_and_blanks() {
        let source = StaticOriginSource::new(vec![
            "https://a.example".to_string(),
            "*".to_string(),
            "  ".to_string(),
        ]);
        assert_eq!(*source.known_origins(), set(&["https://a.example"]));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let source = CachedRegistrySource::new();
        // Responses are popped from the back.
        let client = FakeRegistry::new(vec![
            Err(RegistryError::BackendCommand("boom".to_string())),
            Ok(set(&["https://svc.example"])),
        ]);

        assert!(source.refresh_once(&client, Duration::from_secs(1)).await);
        assert_eq!(*source.known_origins(), set(&["https://svc.example"]));

        assert!(!source.refresh_once(&client, Duration::from_secs(1)).await);
        assert_eq!(*source.known_origins(), set(&["https://svc.example"]));
    }

    #[tokio::test]
    async fn slow_refresh_is_abandoned() {
        let source = CachedRegistrySource::new();
        let client = FakeRegistry {
            delay: Duration::from_millis(200),
            ..FakeRegistry::new(vec![Ok(set(&["https://late.example"]))])
        };

        assert!(!source.refresh_once(&client, Duration::from_millis(10)).await);
        assert!(source.known_origins().is_empty());
    }

    #[tokio::test]
    async fn refresher_populates_immediately() {
        let source = Arc::new(CachedRegistrySource::new());
        let client = FakeRegistry::new(vec![Ok(set(&["https://svc.example", "*"]))]);

        let handle =
            source.spawn_refresher(client, Duration::from_secs(60), Duration::from_secs(1));
        for _ in 0..50 {
            if !source.known_origins().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert_eq!(*source.known_origins(), set(&["https://svc.example"]));
    }
}
