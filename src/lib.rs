//! Recursive self-calling HTTP service.
//!
//! Two listeners share one process: a business listener whose single route
//! calls itself over loopback until a maximum depth, and a diagnostics
//! listener exposing a health check and a Prometheus scrape.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Coordinator;
