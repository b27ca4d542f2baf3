//! Metrics collection and exposition.
//!
//! # Metrics
//! - `health_calls` (counter): number of `/health` calls
//! - `grahovac_requests_total` (counter): requests by listener and status
//! - `grahovac_request_duration_seconds` (histogram): latency by listener
//! - `grahovac_downstream_calls_total` (counter): recursive calls by outcome
//!
//! The Prometheus recorder is owned by [`Metrics`] and never installed as the
//! global recorder. Every update goes through `metrics::with_local_recorder`,
//! so separate instances (one per test, for example) do not share state.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram, Counter, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

pub const HEALTH_CALLS: &str = "health_calls";
pub const REQUESTS_TOTAL: &str = "grahovac_requests_total";
pub const REQUEST_DURATION: &str = "grahovac_request_duration_seconds";
pub const DOWNSTREAM_CALLS: &str = "grahovac_downstream_calls_total";

/// Outcome label for a recursive downstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Ok,
    Error,
    Timeout,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Ok => "ok",
            CallOutcome::Error => "error",
            CallOutcome::Timeout => "timeout",
        }
    }
}

/// Local metrics registry shared by both listeners.
#[derive(Clone)]
pub struct Metrics {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
    health_calls: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let health_calls = metrics::with_local_recorder(&recorder, || {
            describe_counter!(HEALTH_CALLS, "The number of health calls");
            describe_counter!(REQUESTS_TOTAL, "Requests handled, by listener and status");
            describe_histogram!(
                REQUEST_DURATION,
                Unit::Seconds,
                "Request latency, by listener"
            );
            describe_counter!(DOWNSTREAM_CALLS, "Recursive self-calls, by outcome");
            counter!(HEALTH_CALLS)
        });

        Self {
            recorder: Arc::new(recorder),
            handle,
            health_calls,
        }
    }

    pub fn record_health_call(&self) {
        self.health_calls.increment(1);
    }

    /// Record a completed request.
    pub fn record_request(&self, listener: &'static str, status: u16, start_time: Instant) {
        let elapsed = start_time.elapsed().as_secs_f64();
        metrics::with_local_recorder(self.recorder.as_ref(), || {
            counter!(REQUESTS_TOTAL, "listener" => listener, "status" => status.to_string())
                .increment(1);
            histogram!(REQUEST_DURATION, "listener" => listener).record(elapsed);
        });
    }

    pub fn record_downstream_call(&self, outcome: CallOutcome) {
        metrics::with_local_recorder(self.recorder.as_ref(), || {
            counter!(DOWNSTREAM_CALLS, "outcome" => outcome.as_str()).increment(1);
        });
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
