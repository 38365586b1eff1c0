//! System-level routes and utilities

pub mod health_check;

use axum::{routing::get, Router};
use axum_prometheus::metrics_exporter_prometheus::PrometheusHandle;

/// Creates the unauthenticated system routes: health and Prometheus exposition.
#[tracing::instrument(name = "create_system_router", skip(metric_handle))]
pub fn create_system_router(metric_handle: PrometheusHandle) -> Router {
    tracing::info!("Creating system router");

    Router::new()
        .route("/health", get(health_check::health_check))
        .route("/metrics", get(|| async move { metric_handle.render() }))
}

/// The process-wide Prometheus recorder. It can only be installed once, so
/// every test shares this handle.
#[cfg(test)]
pub(crate) fn test_metric_handle() -> PrometheusHandle {
    use axum_prometheus::PrometheusMetricLayer;
    use once_cell::sync::Lazy;

    static HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| PrometheusMetricLayer::pair().1);
    HANDLE.clone()
}
