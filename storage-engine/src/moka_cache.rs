use async_trait::async_trait;
use cache_aside::CacheStoreClient;
use moka::Expiry;
use moka::future::Cache;
use shared::Result;
use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Value plus the TTL it was written with
#[derive(Clone, Debug)]
struct TimedValue {
    value: String,
    ttl: Duration,
}

/// Absolute expiration: the deadline is fixed by the write that created or replaced
/// the entry, reads leave it untouched.
struct AbsoluteExpiry;

impl Expiry<String, TimedValue> for AbsoluteExpiry {
    fn expire_after_create(&self, _key: &String, value: &TimedValue, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &TimedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Moka-based store with per-entry TTL
/// Lock-free and concurrent, optionally bounded by entry count
pub struct MokaStore {
    cache: Cache<String, TimedValue>,
}

impl MokaStore {
    pub fn new(name: String, max_entries: Option<u64>) -> Self {
        let mut builder = Cache::builder().name(&name).expire_after(AbsoluteExpiry);

        if let Some(capacity) = max_entries {
            builder = builder.max_capacity(capacity);
        }

        Self {
            cache: builder.build(),
        }
    }

    pub fn new_unbounded() -> Self {
        Self::new("cache".to_string(), None)
    }
}

#[async_trait]
impl CacheStoreClient for MokaStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        // Either doesn't exist or TTL expired
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.cache
            .insert(key.to_string(), TimedValue { value, ttl })
            .await;
        Ok(())
    }
}

impl Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}
