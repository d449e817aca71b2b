//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the cache store client once, before the server starts
//! - Bind the listener last, so traffic arrives only when ready
//!
//! # Design Decisions
//! - A bind failure is fatal
//! - An unreachable redis is not: the proxy starts and fails requests
//!   closed until the store answers

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::cache::{CacheStore, MemoryStore, RedisStore, StoreError};
use crate::config::{CacheConfig, ListenerConfig, StoreKind};

/// Build the process-wide store client selected by configuration.
pub async fn build_store(config: &CacheConfig) -> Result<Arc<dyn CacheStore>, StoreError> {
    match config.store {
        StoreKind::Redis => {
            let store = RedisStore::open(&config.redis_url)?;
            if let Err(e) = store.connect().await {
                tracing::warn!(
                    redis_url = %config.redis_url,
                    error = %e,
                    "Redis unreachable at startup; requests will fail until it is"
                );
            }
            Ok(Arc::new(store))
        }
        StoreKind::Memory => {
            tracing::info!("Using in-process memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Bind the inbound listener.
pub async fn bind_listener(config: &ListenerConfig) -> Result<TcpListener, std::io::Error> {
    let listener = TcpListener::bind(&config.bind_address).await.map_err(|e| {
        tracing::error!(address = %config.bind_address, error = %e, "Failed to bind listener");
        e
    })?;

    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_selected_by_config() {
        let config = CacheConfig {
            store: StoreKind::Memory,
            ..CacheConfig::default()
        };
        let store = build_store(&config).await.unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn unreachable_redis_does_not_abort_startup() {
        let config = CacheConfig {
            redis_url: "redis://127.0.0.1:1".into(),
            ..CacheConfig::default()
        };
        let store = build_store(&config).await.unwrap();
        assert_eq!(store.name(), "redis");
    }

    #[tokio::test]
    async fn bind_conflict_is_an_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ListenerConfig {
            bind_address: taken.local_addr().unwrap().to_string(),
        };
        assert!(bind_listener(&config).await.is_err());
    }
}
