//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, access-log span)
//!     → handler.rs (cache lookup, backend fetch, cache write)
//!     → response.rs (body or mapped error status)
//!     → Send to client
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use handler::{proxy_handler, ProxyState};
pub use request::{request_id_of, UuidRequestId, X_REQUEST_ID};
pub use response::ProxyError;
pub use server::{build_router, HttpServer};
