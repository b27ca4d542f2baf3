//! Diagnostics listener: health check and Prometheus scrape.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::any,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::observability::{logging, metrics::HEALTH_CALLS, Metrics, StatsdClient};

pub const LISTENER: &str = "diagnostics";

/// Prometheus text exposition format.
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Clone)]
pub struct DiagnosticsState {
    pub metrics: Metrics,
    pub statsd: Arc<StatsdClient>,
}

pub fn diagnostics_router(state: DiagnosticsState) -> Router {
    Router::new()
        .route("/health", any(health_handler))
        .route("/prom", any(prom_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(logging::request_span::<Body>))
}

/// Always 200. A StatsD failure is logged, never surfaced.
async fn health_handler(State(state): State<DiagnosticsState>) -> StatusCode {
    state.metrics.record_health_call();

    if let Err(e) = state.statsd.incr(HEALTH_CALLS, &[], 1.0).await {
        tracing::error!(error = %e, "Can't increment health_calls");
    }

    StatusCode::OK
}

async fn prom_handler(State(state): State<DiagnosticsState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        state.metrics.render(),
    )
}
