//! Metrics endpoint server.
//!
//! # Responsibilities
//! - Serve the Prometheus scrape payload on `/metrics`
//! - Serve a liveness probe on `/health`
//! - Gate `/metrics` behind Basic Auth
//! - Drive periodic recorder upkeep

use axum::{extract::State, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::MetricsAuthConfig;
use crate::http::auth::{metrics_basic_auth, METRICS_PATH};

const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Build the router for the metrics listener.
pub fn metrics_router(handle: PrometheusHandle, credentials: MetricsAuthConfig) -> Router {
    Router::new()
        .route(METRICS_PATH, get(render_metrics))
        .route("/health", get(health))
        .with_state(handle)
        .layer(middleware::from_fn_with_state(
            Arc::new(credentials),
            metrics_basic_auth,
        ))
        .layer(TraceLayer::new_for_http())
}

async fn render_metrics(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

async fn health() -> &'static str {
    "ok"
}

/// Periodically drain histogram buffers held by the recorder.
pub fn spawn_upkeep(handle: PrometheusHandle) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(UPKEEP_INTERVAL);
        loop {
            ticker.tick().await;
            handle.run_upkeep();
        }
    })
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<S>(listener: TcpListener, router: Router, shutdown: S) -> Result<(), std::io::Error>
where
    S: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Metrics server starting");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("Metrics server stopped");
    Ok(())
}
