use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Response of a single read-through lookup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheResult {
    pub cached: bool,
    pub value: String,
}

impl CacheResult {
    pub fn hit(value: impl Into<String>) -> Self {
        Self {
            cached: true,
            value: value.into(),
        }
    }

    pub fn miss(value: impl Into<String>) -> Self {
        Self {
            cached: false,
            value: value.into(),
        }
    }
}

/// A record as held by a store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Entry expiring `ttl` after `now`.
    pub fn expiring(key: impl Into<String>, value: impl Into<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        // Durations too large for chrono never expire
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl));

        Self {
            key: key.into(),
            value: value.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}
