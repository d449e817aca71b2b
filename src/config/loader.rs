//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse configuration from TOML text without semantic checks.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Read a TOML file without semantic checks, so callers can apply
/// overrides before validating.
pub fn read_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogFormat, StoreKind};
    use crate::config::validation::validate_config;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.backend.origin, "http://backend-service");
        assert_eq!(config.cache.store, StoreKind::Redis);
        assert_eq!(config.cache.ttl_secs, 60);
        assert!(config.timeouts.backend_secs.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = parse_config(
            r#"
            [backend]
            origin = "http://127.0.0.1:3000"

            [cache]
            store = "memory"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.origin, "http://127.0.0.1:3000");
        assert_eq!(config.cache.store, StoreKind::Memory);
        assert_eq!(config.cache.redis_url, "redis://localhost:6379");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn unknown_store_kind_is_a_parse_error() {
        let err = parse_config("[cache]\nstore = \"memcached\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn file_values_reach_validation() {
        let path = std::env::temp_dir().join(format!("cache-proxy-{}.toml", std::process::id()));
        fs::write(&path, "[cache]\nttl_secs = 0\n").unwrap();

        let config = read_config(&path).unwrap();
        std::fs::remove_file(&path).unwrap_or_default();

        match validate_config(&config).map_err(ConfigError::Validation).unwrap_err() {
            ConfigError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "cache.ttl_secs");
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_config(Path::new("/nonexistent/cache-proxy.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
