use axum::{Router, extract::State, http::StatusCode, routing::get};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{MetricsError, exporter::ExporterMetrics};

pub fn metrics_router(metrics: Arc<ExporterMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(get_metrics))
        .with_state(metrics)
}

/// Serves the registry until Ctrl+C is received.
pub async fn start_prometheus_metrics_api(
    addr: SocketAddr,
    metrics: Arc<ExporterMetrics>,
) -> Result<(), MetricsError> {
    let listener = TcpListener::bind(addr).await?;
    info!("Starting metrics server at {addr}");

    axum::serve(listener, metrics_router(metrics))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for Ctrl+C, metrics server will not stop gracefully");
        std::future::pending::<()>().await;
    }
}

async fn get_metrics(State(metrics): State<Arc<ExporterMetrics>>) -> (StatusCode, String) {
    match metrics.gather_metrics() {
        Ok(body) => (StatusCode::OK, body),
        Err(error) => {
            warn!(%error, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}
