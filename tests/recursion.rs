//! Recursive handler behaviour against mock downstreams.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use grahovac::http::{business_router, BusinessState, LoopbackClient};
use grahovac::observability::Metrics;
use std::net::SocketAddr;
use tower::ServiceExt;

mod common;

fn router(target: SocketAddr, timeout: Option<Duration>) -> Router {
    business_router(BusinessState {
        client: LoopbackClient::new(target, timeout),
        metrics: Metrics::new(),
        max_depth: 5,
    })
}

async fn call(router: Router, request: Request<Body>) -> StatusCode {
    router.oneshot(request).await.unwrap().status()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_shallow_depths_make_exactly_one_call() {
    for depth in 1..=4 {
        let (addr, recorded) = common::start_recording_backend(202).await;

        let status = call(router(addr, None), get(&format!("/?deep={depth}"))).await;

        assert_eq!(status, StatusCode::ACCEPTED, "downstream status is forwarded");
        let seen = recorded.lock().unwrap().clone();
        assert_eq!(seen.len(), 1, "depth {depth}");
        assert_eq!(seen[0].request_line, format!("GET /?deep={} HTTP/1.1", depth + 1));
    }
}

#[tokio::test]
async fn test_missing_or_empty_depth_defaults_to_one() {
    for uri in ["/", "/?deep="] {
        let (addr, recorded) = common::start_recording_backend(200).await;

        assert_eq!(call(router(addr, None), get(uri)).await, StatusCode::OK);
        assert_eq!(recorded.lock().unwrap()[0].request_line, "GET /?deep=2 HTTP/1.1");
    }
}

#[tokio::test]
async fn test_terminal_and_invalid_depths_make_no_calls() {
    let (addr, recorded) = common::start_recording_backend(500).await;

    assert_eq!(call(router(addr, None), get("/?deep=5")).await, StatusCode::OK);
    assert_eq!(call(router(addr, None), get("/?deep=17")).await, StatusCode::OK);
    assert_eq!(call(router(addr, None), get("/?deep=five")).await, StatusCode::BAD_REQUEST);
    assert_eq!(call(router(addr, None), get("/?deep=")).await, StatusCode::INTERNAL_SERVER_ERROR);

    // Only the defaulted request reached the backend.
    assert_eq!(recorded.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_repeated_depth_key_reads_first_value() {
    let (addr, recorded) = common::start_recording_backend(200).await;

    assert_eq!(call(router(addr, None), get("/?deep=5&deep=1")).await, StatusCode::OK);
    assert!(recorded.lock().unwrap().is_empty(), "first value is terminal");

    assert_eq!(call(router(addr, None), get("/?deep=2&deep=9")).await, StatusCode::OK);
    let seen = recorded.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].request_line, "GET /?deep=3 HTTP/1.1");
}

#[tokio::test]
async fn test_downstream_error_status_forwarded() {
    let (addr, _) = common::start_recording_backend(502).await;
    assert_eq!(call(router(addr, None), get("/?deep=4")).await, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_trace_context_propagates() {
    let (addr, recorded) = common::start_recording_backend(200).await;

    let request = Request::builder()
        .uri("/?deep=2")
        .header("x-datadog-trace-id", "42")
        .header("x-datadog-parent-id", "7")
        .body(Body::empty())
        .unwrap();
    assert_eq!(call(router(addr, None), request).await, StatusCode::OK);

    let seen = recorded.lock().unwrap()[0].clone();
    assert_eq!(seen.header("x-datadog-trace-id"), Some("42"));
    let parent = seen.header("x-datadog-parent-id").unwrap();
    assert_ne!(parent, "7", "a child span id is sent, not the caller's");
    assert!(seen.header("traceparent").unwrap().starts_with("00-0000000000000000000000000000002a-"));
}

#[tokio::test]
async fn test_connection_refused_is_unavailable() {
    let status = call(router(common::dead_addr(), None), get("/?deep=1")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_refusal_deeper_in_chain_propagates_unchanged() {
    // Hop B sits between us and a dead port.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let hop_b = listener.local_addr().unwrap();
    let dead = common::dead_addr();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router(dead, None)).await;
    });

    let status = call(router(hop_b, None), get("/?deep=3")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_call_timeout_is_unavailable() {
    let silent = common::start_silent_backend().await;

    let start = Instant::now();
    let status = call(router(silent, Some(Duration::from_millis(200))), get("/?deep=1")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(start.elapsed() < Duration::from_secs(5));
}
