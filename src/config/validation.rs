//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs before anything binds or connects
//! - Validate value ranges (ttl > 0, timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{ProxyConfig, StoreKind};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `cache.ttl_secs`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic rule and collect all failures.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.listener.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address: {}", config.listener.bind_address, e),
        ));
    }

    if let Err(message) = check_origin(&config.backend.origin) {
        errors.push(ValidationError::new("backend.origin", message));
    }

    if config.cache.store == StoreKind::Redis {
        match Url::parse(&config.cache.redis_url) {
            Ok(url) if matches!(url.scheme(), "redis" | "rediss" | "unix") => {}
            Ok(url) => errors.push(ValidationError::new(
                "cache.redis_url",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(
                "cache.redis_url",
                format!("'{}' is not a URL: {}", config.cache.redis_url, e),
            )),
        }
    }

    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError::new("cache.ttl_secs", "must be greater than zero"));
    }

    if config.timeouts.backend_secs == Some(0) {
        errors.push(ValidationError::new(
            "timeouts.backend_secs",
            "must be greater than zero when set",
        ));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The origin must be a bare `http://host[:port]`; the request path is
/// appended to it verbatim.
fn check_origin(origin: &str) -> Result<(), String> {
    let url = Url::parse(origin).map_err(|e| format!("'{}' is not a URL: {}", origin, e))?;

    if url.scheme() != "http" {
        return Err(format!("scheme must be http, got '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a path, query or fragment".to_string());
    }
    Ok(())
}
