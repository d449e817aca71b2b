//! In-process cache store for local development and tests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::Bytes;
use dashmap::DashMap;

use crate::cache::{CacheKey, CacheStore, StoreError};

#[derive(Debug, Clone)]
struct StoredEntry {
    value: Bytes,
    expires_at: Instant,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// A thread-safe map with per-entry expiry, enforced lazily on read.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, StoredEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, StoreError> {
        // Copy out before removing; DashMap deadlocks if a read guard is
        // held across a write to the same shard.
        let found = self
            .entries
            .get(key.as_str())
            .map(|entry| (entry.is_expired(), entry.value.clone()));

        match found {
            Some((false, value)) => Ok(Some(value)),
            Some((true, _)) => {
                self.entries.remove_if(key.as_str(), |_, entry| entry.is_expired());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        self.entries.insert(
            key.as_str().to_string(),
            StoredEntry {
                value: Bytes::copy_from_slice(value),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
