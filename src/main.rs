//! io-sentry metrics server.
//!
//! # Architecture Overview
//!
//! ```text
//!   application code                                   Prometheus
//!        │                                                  │
//!        ├──▶ CacheFacade ──▶ RemoteStore (redis)           │ scrape
//!        │        │                                         ▼
//!        ├──▶ QueryObserver ──▶ data-access call     ┌──────────────┐
//!        │        │                                  │ /metrics     │
//!        │        ▼                                  │ (Basic Auth) │
//!        └──▶ MetricsSink ──▶ metrics recorder ─────▶│ axum server  │
//!                                                    └──────────────┘
//! ```
//!
//! The binary wires configuration, logging and the Prometheus recorder,
//! probes the configured cache once and serves the metrics endpoint until
//! Ctrl-C.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use io_sentry::cache::{self, CacheFacade};
use io_sentry::config::{load_config, ServiceConfig};
use io_sentry::http;
use io_sentry::observability::{logging, metrics, PrometheusSink};

#[derive(Parser)]
#[command(name = "io-sentry")]
#[command(about = "Cache and query instrumentation metrics server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    }
    .with_env_overrides();

    logging::init_logging(&config.observability)?;

    tracing::info!("io-sentry v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        backend = %config.cache.backend,
        environment = %config.cache.environment,
        service = %config.cache.service,
        default_expiry_secs = config.cache.default_expiry_secs,
        "Configuration loaded"
    );

    let handle = if config.observability.metrics_enabled {
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let store = cache::connect_store(&config.cache)?;
    let facade = CacheFacade::new(store, Arc::new(PrometheusSink), &config.cache);
    probe_cache(&facade).await;

    let Some(handle) = handle else {
        tracing::info!("Metrics endpoint disabled; nothing to serve");
        return Ok(());
    };

    let upkeep = http::spawn_upkeep(handle.clone());

    if config.metrics_auth.password.is_empty() {
        tracing::warn!(
            username = %config.metrics_auth.username,
            "Metrics password is empty; set METRICS_PASSWORD to protect /metrics"
        );
    }

    let listener = TcpListener::bind(&config.observability.metrics_address).await?;
    let router = http::metrics_router(handle, config.metrics_auth.clone());
    http::serve(listener, router, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown signal received");
    })
    .await?;

    upkeep.abort();
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Write, read back and remove a marker entry to report cache reachability.
async fn probe_cache(facade: &CacheFacade) {
    let written = facade.set("startup", "probe", &true, Some(30)).await;
    let read_back = facade.get::<bool>("startup", "probe").await;
    facade.delete("startup", "probe").await;

    if written && read_back == Some(true) {
        tracing::info!(backend = facade.backend(), "Cache reachable");
    } else {
        tracing::warn!(
            backend = facade.backend(),
            "Cache unreachable; callers will see misses until it recovers"
        );
    }
}
