//! Business listener: the recursive self-calling route.
//!
//! `GET /?deep=<n>` calls `GET /?deep=<n+1>` on the same service until
//! `n >= max_depth`, then the terminal 200 bubbles back through every hop.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderMap, StatusCode},
    routing::any,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::http::client::{CallError, LoopbackClient};
use crate::observability::{logging, CallOutcome, Metrics, TraceContext};

pub const LISTENER: &str = "business";

/// Depth used when `deep` is absent or empty.
const DEFAULT_DEPTH: &str = "1";

/// State injected into the business handler.
#[derive(Clone)]
pub struct BusinessState {
    pub client: LoopbackClient,
    pub metrics: Metrics,
    pub max_depth: i64,
}

/// Build the business router with its middleware stack.
pub fn business_router(state: BusinessState) -> Router {
    Router::new()
        .route("/", any(recursive_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(logging::request_span::<Body>))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CatchPanicLayer::new()),
        )
}

async fn recursive_handler(
    State(state): State<BusinessState>,
    headers: HeaderMap,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> StatusCode {
    let start_time = Instant::now();

    let deep = match query {
        Ok(Query(params)) => first_depth(params).unwrap_or_else(|| DEFAULT_DEPTH.to_string()),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Unparseable query string");
            state
                .metrics
                .record_request(LISTENER, StatusCode::BAD_REQUEST.as_u16(), start_time);
            return StatusCode::BAD_REQUEST;
        }
    };

    let trace = TraceContext::child_of(TraceContext::extract(&headers).ok());
    let span = tracing::info_span!(
        "calculating_d",
        deep = %deep,
        dd.trace_id = trace.trace_id,
        dd.span_id = trace.span_id
    );

    let status = recurse(&state, &headers, &deep, trace).instrument(span).await;
    state.metrics.record_request(LISTENER, status.as_u16(), start_time);
    status
}

/// First `deep` value in the query; an empty first value counts as absent.
fn first_depth(params: Vec<(String, String)>) -> Option<String> {
    params
        .into_iter()
        .find(|(key, _)| key == "deep")
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

async fn recurse(
    state: &BusinessState,
    headers: &HeaderMap,
    deep: &str,
    trace: TraceContext,
) -> StatusCode {
    tracing::debug!(headers = ?headers, "The request received");

    let depth: i64 = match deep.parse() {
        Ok(depth) => depth,
        Err(_) => return StatusCode::BAD_REQUEST,
    };

    tracing::info!(depth, "The d is {}", depth);

    if depth >= state.max_depth {
        return StatusCode::OK;
    }

    let request = match state.client.build_request(depth + 1, &trace) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(error = %e, "Cannot prepare downstream request");
            return StatusCode::SERVICE_UNAVAILABLE;
        }
    };

    tracing::debug!(headers = ?request.headers(), "The request to send");

    match state.client.send(request).await {
        Ok(status) => {
            state.metrics.record_downstream_call(CallOutcome::Ok);
            status
        }
        Err(e) => {
            let outcome = match e {
                CallError::Timeout(_) => CallOutcome::Timeout,
                _ => CallOutcome::Error,
            };
            state.metrics.record_downstream_call(outcome);
            tracing::warn!(
                error = %e,
                target_addr = %state.client.target(),
                "Downstream call failed"
            );
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
