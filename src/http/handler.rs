//! The cache-aside proxy handler.
//!
//! ```text
//! request → key = path?query
//!         → store.get(key)
//!             hit   → 200 cached bytes
//!             error → 500
//!             miss  → backend GET
//!                         transport error → 502
//!                         read error      → 500
//!                         body → store.set(key, body, ttl)
//!                                   error → 500 (body discarded)
//!                                   ok    → 200 body
//! ```
//!
//! Concurrent misses on one key each fetch and each write; there is no
//! single-flight coalescing. The flow runs on its own task, so a client
//! that disconnects mid-request does not cancel the fetch or the write.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use crate::backend::{BackendFetcher, FetchError};
use crate::cache::{CacheKey, CacheStore};
use crate::http::request::request_id_of;
use crate::http::response::{body_response, ProxyError};
use crate::observability::metrics::{self, CacheStatus};

/// Shared handler state. Holds no per-request data.
#[derive(Clone)]
pub struct ProxyState {
    pub store: Arc<dyn CacheStore>,
    pub fetcher: Arc<dyn BackendFetcher>,
    /// Expiry attached to every write.
    pub entry_ttl: Duration,
}

impl ProxyState {
    pub fn new(store: Arc<dyn CacheStore>, fetcher: Arc<dyn BackendFetcher>, entry_ttl: Duration) -> Self {
        Self {
            store,
            fetcher,
            entry_ttl,
        }
    }
}

/// Catch-all handler. Method is not restricted and the body is never read.
pub async fn proxy_handler(State(state): State<ProxyState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id_of(&request).to_string();
    let method = request.method().clone();
    let key = CacheKey::from_uri(request.uri());
    drop(request);

    let flow = tokio::spawn(
        async move { lookup_or_fetch(&state, &key, &request_id).await }.instrument(tracing::Span::current()),
    );
    let outcome = match flow.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "Request task failed");
            Err(ProxyError::Task(e))
        }
    };

    let (response, cache) = match outcome {
        Ok((body, cache)) => (body_response(body), cache),
        Err(e) => {
            let cache = match e {
                ProxyError::CacheRead(_) => CacheStatus::Error,
                _ => CacheStatus::Miss,
            };
            (e.into_response(), cache)
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), cache, start);
    response
}

async fn lookup_or_fetch(
    state: &ProxyState,
    key: &CacheKey,
    request_id: &str,
) -> Result<(Bytes, CacheStatus), ProxyError> {
    match state.store.get(key).await {
        Ok(Some(cached)) => {
            tracing::debug!(request_id = %request_id, cache_key = %key, bytes = cached.len(), "Cache hit");
            metrics::record_cache_lookup(CacheStatus::Hit);
            return Ok((cached, CacheStatus::Hit));
        }
        Ok(None) => {
            tracing::debug!(request_id = %request_id, cache_key = %key, "Cache miss, forwarding to backend");
            metrics::record_cache_lookup(CacheStatus::Miss);
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                cache_key = %key,
                store = state.store.name(),
                error = %e,
                "Cache read failed"
            );
            metrics::record_cache_lookup(CacheStatus::Error);
            return Err(ProxyError::CacheRead(e));
        }
    }

    let body = match state.fetcher.fetch(key.as_str()).await {
        Ok(body) => {
            metrics::record_backend_fetch("ok");
            body
        }
        Err(e) => {
            let outcome = match e {
                FetchError::Transport(_) => "transport_error",
                FetchError::Read(_) => "read_error",
            };
            tracing::warn!(request_id = %request_id, cache_key = %key, error = %e, "Backend fetch failed");
            metrics::record_backend_fetch(outcome);
            return Err(e.into());
        }
    };

    if let Err(e) = state.store.set(key, &body, state.entry_ttl).await {
        tracing::error!(
            request_id = %request_id,
            cache_key = %key,
            store = state.store.name(),
            error = %e,
            "Cache write failed, discarding backend body"
        );
        return Err(ProxyError::CacheWrite(e));
    }

    tracing::debug!(
        request_id = %request_id,
        cache_key = %key,
        bytes = body.len(),
        ttl_secs = state.entry_ttl.as_secs(),
        "Cached backend response"
    );
    Ok((body, CacheStatus::Miss))
}
