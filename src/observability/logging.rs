//! Structured logging.
//!
//! Uses `tracing` with an `EnvFilter`. JSON output for production, pretty
//! output for development. `RUST_LOG` wins over the configured level.
//!
//! Every event carries the service `version`: `main` runs inside
//! [`root_span`], and per-connection tasks (which start outside it) get the
//! field from [`request_span`].

use axum::http::Request;
use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global subscriber. Call once, from `main`.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "grahovac={level},tower_http={level}",
            level = config.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}

/// Process-wide span.
pub fn root_span() -> Span {
    tracing::info_span!("grahovac", version = VERSION)
}

/// Span for one HTTP request, used as the `TraceLayer` span maker.
pub fn request_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        version = VERSION
    )
}
