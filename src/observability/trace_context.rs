//! Trace context propagation.
//!
//! # Responsibilities
//! - Extract trace context from incoming requests
//! - Start a child span for each handled request
//! - Inject the child context into outgoing requests
//!
//! Datadog headers are read first, W3C `traceparent` second. Both are written
//! on injection. Only the low 64 bits of a W3C trace id are kept.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use rand::Rng;
use thiserror::Error;

pub const DATADOG_TRACE_ID: &str = "x-datadog-trace-id";
pub const DATADOG_PARENT_ID: &str = "x-datadog-parent-id";
pub const TRACEPARENT: &str = "traceparent";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TraceError {
    #[error("no trace context headers present")]
    Missing,

    #[error("malformed {header} header")]
    Malformed { header: &'static str },

    #[error("cannot encode {header} header")]
    Inject { header: &'static str },
}

/// Correlation identifiers for one span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: u64,
    pub span_id: u64,
}

impl TraceContext {
    /// Start a new trace.
    pub fn new_root() -> Self {
        Self {
            trace_id: random_id(),
            span_id: random_id(),
        }
    }

    /// Start a span in the same trace.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: random_id(),
        }
    }

    /// Child of `parent` if there is one, otherwise a new root.
    pub fn child_of(parent: Option<TraceContext>) -> Self {
        parent.map_or_else(Self::new_root, |p| p.child())
    }

    /// Read the caller's context from request headers.
    pub fn extract(headers: &HeaderMap) -> Result<Self, TraceError> {
        if headers.contains_key(DATADOG_TRACE_ID) {
            return Self::extract_datadog(headers);
        }
        match headers.get(TRACEPARENT) {
            Some(value) => Self::parse_traceparent(value),
            None => Err(TraceError::Missing),
        }
    }

    fn extract_datadog(headers: &HeaderMap) -> Result<Self, TraceError> {
        let trace_id = decimal_header(headers, DATADOG_TRACE_ID)?;
        let span_id = decimal_header(headers, DATADOG_PARENT_ID)?;
        Ok(Self { trace_id, span_id })
    }

    fn parse_traceparent(value: &HeaderValue) -> Result<Self, TraceError> {
        let malformed = TraceError::Malformed { header: TRACEPARENT };
        let value = value.to_str().map_err(|_| malformed.clone())?;

        let mut parts = value.trim().split('-');
        let (Some(version), Some(trace), Some(span), Some(flags), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(malformed);
        };
        if version.len() != 2 || trace.len() != 32 || span.len() != 16 || flags.len() != 2 {
            return Err(malformed);
        }

        let trace_id = u128::from_str_radix(trace, 16).map_err(|_| malformed.clone())? as u64;
        let span_id = u64::from_str_radix(span, 16).map_err(|_| malformed.clone())?;
        if trace_id == 0 || span_id == 0 {
            return Err(malformed);
        }

        Ok(Self { trace_id, span_id })
    }

    /// Write this context into outgoing request headers.
    pub fn inject(&self, headers: &mut HeaderMap) -> Result<(), TraceError> {
        insert(headers, DATADOG_TRACE_ID, self.trace_id.to_string())?;
        insert(headers, DATADOG_PARENT_ID, self.span_id.to_string())?;
        insert(headers, TRACEPARENT, self.traceparent())?;
        Ok(())
    }

    /// W3C `traceparent` value with the sampled flag set.
    pub fn traceparent(&self) -> String {
        format!("00-{:032x}-{:016x}-01", self.trace_id as u128, self.span_id)
    }
}

fn random_id() -> u64 {
    rand::thread_rng().gen_range(1..=u64::MAX)
}

fn decimal_header(headers: &HeaderMap, header: &'static str) -> Result<u64, TraceError> {
    headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|id| *id != 0)
        .ok_or(TraceError::Malformed { header })
}

fn insert(headers: &mut HeaderMap, header: &'static str, value: String) -> Result<(), TraceError> {
    let value = HeaderValue::try_from(value).map_err(|_| TraceError::Inject { header })?;
    headers.insert(HeaderName::from_static(header), value);
    Ok(())
}
