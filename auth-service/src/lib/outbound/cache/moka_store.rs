use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;

use crate::domain::token::errors::CacheError;
use crate::domain::token::ports::CacheStore;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    ttl: Option<Duration>,
}

/// Per-entry expiry: each entry carries its own time to live, and an
/// overwrite restarts the countdown with the new entry's lifetime.
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// In-process cache backend built on [`moka::future::Cache`].
///
/// Capacity-bounded; entries past capacity are evicted before their TTL.
pub struct MokaCacheStore {
    entries: Cache<String, CacheEntry>,
}

impl MokaCacheStore {
    /// Create a store holding at most `max_capacity` entries.
    pub fn new(max_capacity: u64) -> Self {
        tracing::info!(max_capacity, "Initializing in-process token cache");

        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();

        Self { entries }
    }
}

#[async_trait]
impl CacheStore for MokaCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.entries
            .insert(key.to_string(), CacheEntry { value, ttl: None })
            .await;
        Ok(())
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.entries
            .insert(
                key.to_string(),
                CacheEntry {
                    value,
                    ttl: Some(ttl),
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}
