//! Backend origin access.
//!
//! # Data Flow
//! ```text
//! cache miss for "/path?query"
//!     → BackendFetcher::fetch("/path?query")
//!     → GET <origin>/path?query (no inbound headers forwarded)
//!     → full body bytes | FetchError::Transport | FetchError::Read
//! ```
//!
//! # Design Decisions
//! - Exactly one attempt per miss; no retries or backoff
//! - Status and headers of the backend response are discarded, only the
//!   body is returned, whatever the status code
//! - Transport and read failures are distinct so the handler can answer
//!   502 and 500 respectively

pub mod http;

use async_trait::async_trait;
use axum::body::Bytes;

pub use self::http::HttpFetcher;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a backend fetch produced no body.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The backend could not be reached or never answered.
    #[error("backend transport failure: {0}")]
    Transport(BoxError),

    /// The backend answered but the body could not be fully read.
    #[error("backend body read failure: {0}")]
    Read(BoxError),
}

/// Issues a GET for a path+query against a fixed origin.
#[async_trait]
pub trait BackendFetcher: Send + Sync {
    async fn fetch(&self, path_and_query: &str) -> Result<Bytes, FetchError>;
}
