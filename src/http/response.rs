//! Response construction and error mapping.
//!
//! # Responsibilities
//! - Serve cached or freshly fetched bodies as bare 200 responses
//! - Map every failure on the request path to a status and short text
//!
//! # Design Decisions
//! - Backend status and headers are never propagated; only the body is
//! - Error bodies are a fixed line of text, never the underlying error

use axum::body::{Body, Bytes};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::backend::FetchError;
use crate::cache::StoreError;

/// Terminal failures of the cache-aside flow.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The store failed for a reason other than a miss.
    #[error("cache read failed: {0}")]
    CacheRead(#[source] StoreError),

    #[error(transparent)]
    Backend(#[from] FetchError),

    /// The body was fetched but could not be stored; it is not served.
    #[error("cache write failed: {0}")]
    CacheWrite(#[source] StoreError),

    /// The detached request task panicked or was cancelled.
    #[error("request task failed: {0}")]
    Task(#[source] tokio::task::JoinError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::CacheRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Backend(FetchError::Transport(_)) => StatusCode::BAD_GATEWAY,
            ProxyError::Backend(FetchError::Read(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::CacheWrite(_) | ProxyError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent to the client.
    pub fn client_message(&self) -> &'static str {
        match self {
            ProxyError::CacheRead(_) => "Redis error",
            ProxyError::Backend(FetchError::Transport(_)) => "Failed to fetch from backend",
            ProxyError::Backend(FetchError::Read(_)) => "Failed to read backend response",
            ProxyError::CacheWrite(_) => "Failed to cache response",
            ProxyError::Task(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.client_message()).into_response()
    }
}

/// A 200 carrying `body` verbatim, with no content type of its own.
pub fn body_response(body: Bytes) -> Response {
    Response::new(Body::from(body))
}
