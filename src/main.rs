use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use cache_proxy::config::{read_config, validate_config, ConfigError, ProxyConfig, StoreKind};
use cache_proxy::lifecycle::{signals, startup, Shutdown};
use cache_proxy::observability::{logging, metrics};
use cache_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "cache-proxy")]
#[command(about = "Cache-aside HTTP reverse proxy backed by redis", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080.
    #[arg(long)]
    bind: Option<String>,

    /// Backend origin, e.g. http://backend-service.
    #[arg(long)]
    backend: Option<String>,

    /// Redis URL, e.g. redis://localhost:6379.
    #[arg(long)]
    redis_url: Option<String>,

    /// Keep entries in process memory instead of redis.
    #[arg(long)]
    memory_store: bool,
}

impl Cli {
    fn apply(&self, config: &mut ProxyConfig) {
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(backend) = &self.backend {
            config.backend.origin = backend.clone();
        }
        if let Some(url) = &self.redis_url {
            config.cache.redis_url = url.clone();
        }
        if self.memory_store {
            config.cache.store = StoreKind::Memory;
        }
    }
}

fn load(cli: &Cli) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    logging::init_logging(&config.observability);

    tracing::info!("cache-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.origin,
        store = ?config.cache.store,
        ttl_secs = config.cache.ttl_secs,
        backend_timeout_secs = ?config.timeouts.backend_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = startup::build_store(&config.cache).await?;
    let listener = startup::bind_listener(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    let server = HttpServer::new(config, store);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
