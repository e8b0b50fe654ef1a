#![deny(clippy::all)]

use async_trait::async_trait;
use shared::Result;
use std::time::Duration;

// Ports are the pluggable extension points for underlying store implementations

/// Port for the key-value store backing the cache
#[async_trait]
pub trait CacheStoreClient: Send + Sync + 'static {
    /// Returns the live value for `key`, or `None` when it was never set or has expired.
    /// A missing key is never an error.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes or overwrites `key`, expiring it `ttl` after this call.
    /// Reads never extend the deadline.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
}
