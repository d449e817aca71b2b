//! Redis-backed cache store.
//!
//! Every request task shares one `ConnectionManager`. It multiplexes
//! commands over a single connection, and when that connection drops it
//! reconnects in the background. The command that saw the drop still fails.
//! The first connect happens at startup. If it fails there, the next request
//! tries again, and that repeats until one attempt succeeds.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use redis::aio::ConnectionManager;
use redis::Client;
use tokio::sync::OnceCell;

use crate::cache::{CacheKey, CacheStore, StoreError};

/// Backoff for connect and reconnect attempts: 200 ms, then 400 ms.
const CONNECT_BACKOFF_BASE: u64 = 2;
const CONNECT_BACKOFF_FACTOR: u64 = 100;
const CONNECT_RETRIES: usize = 2;

pub struct RedisStore {
    client: Client,
    manager: OnceCell<ConnectionManager>,
}

impl RedisStore {
    /// Parse the URL without connecting.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url)?;
        Ok(Self {
            client,
            manager: OnceCell::new(),
        })
    }

    /// Establish the shared connection now rather than on first use.
    pub async fn connect(&self) -> Result<(), StoreError> {
        self.manager().await.map(|_| ())
    }

    /// Whether a connection has ever been established.
    pub fn is_connected(&self) -> bool {
        self.manager.initialized()
    }

    async fn manager(&self) -> Result<ConnectionManager, StoreError> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new_with_backoff(
                    self.client.clone(),
                    CONNECT_BACKOFF_BASE,
                    CONNECT_BACKOFF_FACTOR,
                    CONNECT_RETRIES,
                )
                .await?;
                tracing::info!("Connected to redis");
                Ok::<_, StoreError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, StoreError> {
        let mut conn = self.manager().await?;
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key.as_str())
            .query_async(&mut conn)
            .await?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.manager().await?;
        // EX rejects zero, so sub-second TTLs round up.
        let _: () = redis::cmd("SET")
            .arg(key.as_str())
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
