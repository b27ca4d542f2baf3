//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (local Prometheus registry)
//!     → statsd.rs (external counters over UDP)
//!     → trace_context.rs (span ids carried across the recursive call)
//!
//! Consumers:
//!     → stdout (JSON or pretty)
//!     → /prom on the diagnostics listener
//!     → StatsD agent
//! ```
//!
//! # Design Decisions
//! - Registries and clients are values owned by the coordinator, not globals
//! - Trace ids are correlation only; nothing is exported to a tracer

pub mod logging;
pub mod metrics;
pub mod statsd;
pub mod trace_context;

pub use metrics::{CallOutcome, Metrics};
pub use statsd::{StatsdClient, StatsdError};
pub use trace_context::{TraceContext, TraceError};
