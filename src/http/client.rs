//! Loopback HTTP client for the recursive self-call.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::observability::{TraceContext, TraceError};

#[derive(Debug, Error)]
pub enum CallError {
    #[error("failed to inject trace context: {0}")]
    Inject(#[from] TraceError),

    #[error("failed to build request: {0}")]
    Build(#[from] axum::http::Error),

    #[error("downstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("downstream request timed out after {0:?}")]
    Timeout(Duration),
}

/// Issues `GET /?deep=<n>` against a fixed target, usually our own business port.
#[derive(Clone)]
pub struct LoopbackClient {
    client: Client<HttpConnector, Body>,
    target: SocketAddr,
    timeout: Option<Duration>,
}

impl LoopbackClient {
    /// `timeout` of `None` leaves the call unbounded.
    pub fn new(target: SocketAddr, timeout: Option<Duration>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            target,
            timeout,
        }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Build the outgoing request with trace headers injected.
    pub fn build_request(&self, depth: i64, trace: &TraceContext) -> Result<Request<Body>, CallError> {
        let mut request = Request::builder()
            .method(Method::GET)
            .uri(format!("http://{}/?deep={}", self.target, depth))
            .body(Body::empty())?;
        trace.inject(request.headers_mut())?;
        Ok(request)
    }

    /// Send the request and return the downstream status code.
    pub async fn send(&self, request: Request<Body>) -> Result<StatusCode, CallError> {
        let call = self.client.request(request);
        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| CallError::Timeout(limit))??,
            None => call.await?,
        };
        Ok(response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request() {
        let client = LoopbackClient::new("127.0.0.1:8080".parse().unwrap(), None);
        let trace = TraceContext { trace_id: 10, span_id: 20 };

        let request = client.build_request(3, &trace).unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.uri().to_string(), "http://127.0.0.1:8080/?deep=3");
        assert_eq!(request.headers()["x-datadog-trace-id"], "10");
        assert_eq!(request.headers()["x-datadog-parent-id"], "20");
    }
}
