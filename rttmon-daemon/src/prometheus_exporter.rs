#![forbid(unsafe_code)]

use std::net::SocketAddr;

use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::{routing::get, Router};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::errors::{DaemonError, Result};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

async fn render_metrics() -> impl IntoResponse {
    ([(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], rttmon_telemetry::dump_prometheus())
}

pub fn router() -> Router {
    Router::new().route("/metrics", get(render_metrics))
}

/// Serve `GET /metrics` on `addr` until `shutdown` turns true.
/// Returns the server task and the bound address (useful with port 0).
pub async fn start_server(addr: SocketAddr, mut shutdown: watch::Receiver<bool>) -> Result<(JoinHandle<()>, SocketAddr)> {
    rttmon_telemetry::register_defaults();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| DaemonError::exporter(format!("bind {addr}: {e}")))?;
    let local = listener.local_addr()?;
    let server = tokio::spawn(async move {
        let stop = async move {
            // A dropped sender also ends the server.
            let _ = shutdown.wait_for(|stop| *stop).await;
        };
        if let Err(e) = axum::serve(listener, router()).with_graceful_shutdown(stop).await {
            warn!("metrics server stopped: {e}");
        }
    });
    info!(%local, "prometheus exporter listening");
    Ok((server, local))
}
