//! Shared doubles and helpers for the integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use cache_proxy::{BackendFetcher, CacheKey, CacheStore, FetchError, MemoryStore, StoreError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

type Respond = dyn Fn(&str) -> Result<Bytes, FetchError> + Send + Sync;

/// Fetcher double that records every call.
pub struct CountingFetcher {
    calls: AtomicUsize,
    paths: Mutex<Vec<String>>,
    delay: Option<Duration>,
    respond: Box<Respond>,
}

impl CountingFetcher {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&str) -> Result<Bytes, FetchError> + Send + Sync + 'static,
    {
        Self {
            calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
            delay: None,
            respond: Box::new(respond),
        }
    }

    /// Answers `/anything?id=N` with `OK-N`, anything else with `OK`.
    pub fn ok_with_id() -> Self {
        Self::new(|path| {
            let id = path.split("id=").nth(1).unwrap_or_default();
            if id.is_empty() {
                Ok(Bytes::from_static(b"OK"))
            } else {
                Ok(Bytes::from(format!("OK-{}", id)))
            }
        })
    }

    pub fn fixed(body: &'static [u8]) -> Self {
        Self::new(move |_| Ok(Bytes::from_static(body)))
    }

    pub fn transport_failure() -> Self {
        Self::new(|_| Err(FetchError::Transport("connection refused".into())))
    }

    pub fn read_failure() -> Self {
        Self::new(|_| Err(FetchError::Read("connection reset mid-body".into())))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackendFetcher for CountingFetcher {
    async fn fetch(&self, path_and_query: &str) -> Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(path_and_query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.respond)(path_and_query)
    }
}

/// A write observed by `RecordingStore`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSet {
    pub key: String,
    pub value: Vec<u8>,
    pub ttl: Duration,
}

/// Memory store wrapper with call counts and switchable failures.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    gets: AtomicUsize,
    sets: Mutex<Vec<RecordedSet>>,
    fail_get: AtomicBool,
    fail_set: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> Vec<RecordedSet> {
        self.sets.lock().unwrap().clone()
    }
}

fn store_down(detail: &str) -> StoreError {
    redis::RedisError::from((redis::ErrorKind::IoError, "store unreachable", detail.to_string())).into()
}

#[async_trait]
impl CacheStore for RecordingStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(store_down("connection refused"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        self.sets.lock().unwrap().push(RecordedSet {
            key: key.as_str().to_string(),
            value: value.to_vec(),
            ttl,
        });
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(store_down("connection reset"));
        }
        self.inner.set(key, value, ttl).await
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Drive one request through the router in-process.
pub async fn send(router: &Router, method: Method, uri: &str) -> (StatusCode, Bytes) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Bytes) {
    send(router, Method::GET, uri).await
}

/// Start a raw-TCP backend on an ephemeral port. `f` receives the request
/// target (path and query) and returns status and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }
                        let head = String::from_utf8_lossy(&head).into_owned();
                        let target = head
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("/")
                            .to_string();

                        let (status, body) = f(target).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
