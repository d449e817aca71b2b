//! HTTP fetcher for the fixed backend origin.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body, Bytes};
use axum::http::{Request, Response, Uri};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::backend::{BackendFetcher, FetchError};
use crate::config::{BackendConfig, TimeoutConfig};

/// Fetches `<origin><path?query>` with a pooled hyper client.
///
/// The client is cloned cheaply and shared across tasks; its connection
/// pool is the only state carried between fetches.
#[derive(Clone)]
pub struct HttpFetcher {
    origin: String,
    timeout: Option<Duration>,
    client: Client<HttpConnector, Body>,
}

impl HttpFetcher {
    /// `origin` is e.g. `http://backend-service`; a trailing slash is dropped.
    pub fn new(origin: &str, timeout: Option<Duration>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            origin: origin.trim_end_matches('/').to_string(),
            timeout,
            client,
        }
    }

    pub fn from_config(backend: &BackendConfig, timeouts: &TimeoutConfig) -> Self {
        Self::new(&backend.origin, timeouts.backend())
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn target(&self, path_and_query: &str) -> Result<Uri, FetchError> {
        let suffix = if path_and_query.is_empty() { "/" } else { path_and_query };
        format!("{}{}", self.origin, suffix)
            .parse::<Uri>()
            .map_err(|e| FetchError::Transport(e.into()))
    }

    async fn get(&self, uri: Uri) -> Result<Bytes, FetchError> {
        let request = Request::get(uri)
            .body(Body::empty())
            .map_err(|e| FetchError::Transport(e.into()))?;

        let response: Response<Incoming> = self
            .client
            .request(request)
            .await
            .map_err(|e| FetchError::Transport(e.into()))?;

        tracing::trace!(status = %response.status(), "Backend responded");

        to_bytes(Body::new(response.into_body()), usize::MAX)
            .await
            .map_err(|e| FetchError::Read(e.into()))
    }
}

#[async_trait]
impl BackendFetcher for HttpFetcher {
    async fn fetch(&self, path_and_query: &str) -> Result<Bytes, FetchError> {
        let uri = self.target(path_and_query)?;

        match self.timeout {
            None => self.get(uri).await,
            Some(limit) => tokio::time::timeout(limit, self.get(uri))
                .await
                .map_err(|_| {
                    FetchError::Transport(format!("no complete response within {:?}", limit).into())
                })?,
        }
    }
}
