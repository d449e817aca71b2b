//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy handler and startup produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (text or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Metrics are cheap and disabled unless configured

pub mod logging;
pub mod metrics;
