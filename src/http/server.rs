//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, access-log tracing)
//! - Build the backend fetcher from configuration
//! - Serve on a bound listener until shutdown is signalled

use axum::{body::Body, routing::any, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::backend::{BackendFetcher, HttpFetcher};
use crate::cache::CacheStore;
use crate::config::ProxyConfig;
use crate::http::handler::{proxy_handler, ProxyState};
use crate::http::request::{request_span, UuidRequestId};

/// HTTP server for the caching proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server that fetches misses from `config.backend.origin`.
    pub fn new(config: ProxyConfig, store: Arc<dyn CacheStore>) -> Self {
        let fetcher = Arc::new(HttpFetcher::from_config(&config.backend, &config.timeouts));
        Self::with_fetcher(config, store, fetcher)
    }

    /// Create a server with an explicit fetcher.
    pub fn with_fetcher(
        config: ProxyConfig,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn BackendFetcher>,
    ) -> Self {
        let state = ProxyState::new(store, fetcher, config.cache.ttl());
        let router = build_router(state);
        Self { router, config }
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires. In-flight requests are drained before returning.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend.origin,
            ttl_secs = self.config.cache.ttl_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: ProxyState) -> Router {
    Router::new()
        .route("/", any(proxy_handler))
        .route("/{*path}", any(proxy_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}
