//! Cache store subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request URI
//!     → CacheKey (path + query, verbatim)
//!     → CacheStore::get  → Some(bytes) | None (miss) | Err (fail closed)
//!     → CacheStore::set  (after a successful backend fetch, fixed TTL)
//! ```
//!
//! # Design Decisions
//! - Stores own expiry; the proxy never tracks entry age or deletes entries
//! - "Not found" is `Ok(None)`, never an error variant
//! - Implementations are shared across all request tasks and must be
//!   safe for concurrent use without extra locking

pub mod memory;
pub mod redis_store;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::Uri;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

/// Identifies a cacheable response: the request path plus query string.
///
/// No normalization is applied, so `/a?x=1&y=2` and `/a?y=2&x=1` are
/// different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derive the key from an inbound request URI. Scheme and authority
    /// are ignored.
    pub fn from_uri(uri: &Uri) -> Self {
        let key = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .filter(|pq| !pq.is_empty())
            .unwrap_or("/");
        Self(key.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from a cache store other than a miss.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Get / set-with-expiry against a key-value store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` is a miss; any `Err` is a store failure.
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, StoreError>;

    /// Write `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<(), StoreError>;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(uri: &str) -> CacheKey {
        CacheKey::from_uri(&uri.parse::<Uri>().unwrap())
    }

    #[test]
    fn key_is_path_and_query() {
        assert_eq!(key("/widgets?id=7").as_str(), "/widgets?id=7");
        assert_eq!(key("/widgets").as_str(), "/widgets");
        assert_eq!(key("/").as_str(), "/");
    }

    #[test]
    fn key_ignores_scheme_and_host() {
        assert_eq!(key("http://a.example/widgets?id=7"), key("/widgets?id=7"));
        assert_eq!(key("http://b.example:8080/widgets?id=7"), key("/widgets?id=7"));
    }

    #[test]
    fn key_is_not_normalized() {
        assert_ne!(key("/a?x=1&y=2"), key("/a?y=2&x=1"));
        assert_ne!(key("/a/"), key("/a"));
    }
}
