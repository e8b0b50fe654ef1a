use crate::domain::CacheResult;
use crate::ports::CacheStoreClient;
use crate::value::{UtcTimestamp, ValueSource};
use shared::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Read-through cache-aside over a single store
///
/// Holds no mutable state; concurrent requests only interact through the store.
/// Two concurrent misses on the same key may both write, the store keeps the last one.
#[derive(Clone)]
pub struct CacheGateway {
    store: Arc<dyn CacheStoreClient>,
    values: Arc<dyn ValueSource>,
    ttl: Duration,
}

impl CacheGateway {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

    /// Gateway computing UTC timestamps on a miss.
    pub fn new(store: Arc<dyn CacheStoreClient>, ttl: Duration) -> Self {
        Self::with_value_source(store, Arc::new(UtcTimestamp), ttl)
    }

    pub fn with_value_source(
        store: Arc<dyn CacheStoreClient>,
        values: Arc<dyn ValueSource>,
        ttl: Duration,
    ) -> Self {
        Self { store, values, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the stored value for `key`, computing and storing a fresh one on a miss.
    pub async fn handle_request(&self, key: &str) -> Result<CacheResult> {
        if key.is_empty() {
            return Err(Error::InvalidKey);
        }

        if let Some(value) = self.store.get(key).await? {
            info!(key, "cache hit");
            return Ok(CacheResult::hit(value));
        }

        info!(key, "cache miss");
        let fresh = self.values.compute();
        self.store.set(key, fresh.clone(), self.ttl).await?;

        Ok(CacheResult::miss(fresh))
    }
}

impl std::fmt::Debug for CacheGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheGateway")
            .field("ttl", &self.ttl)
            .finish()
    }
}
