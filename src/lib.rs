//! Cache-aside HTTP reverse proxy.
//!
//! ```text
//!   client ──▶ http::handler ──▶ cache::CacheStore::get
//!                  │                 │ hit ──────────────────────────┐
//!                  │                 ▼ miss                          │
//!                  │            backend::BackendFetcher::fetch       │
//!                  │                 ▼                               │
//!                  │            cache::CacheStore::set (ttl)         │
//!                  ▼                 ▼                               ▼
//!   client ◀──────────────────── response body (200) or error status
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use backend::{BackendFetcher, FetchError, HttpFetcher};
pub use cache::{CacheKey, CacheStore, MemoryStore, RedisStore, StoreError};
pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
