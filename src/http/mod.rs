//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! business listener
//!     → recursive.rs (parse depth, start span)
//!     → client.rs (GET /?deep=n+1 back into the business listener)
//!     → status code forwarded to the caller
//!
//! diagnostics listener
//!     → diagnostics.rs (/health, /prom)
//! ```

pub mod client;
pub mod diagnostics;
pub mod recursive;
pub mod server;

pub use client::{CallError, LoopbackClient};
pub use diagnostics::{diagnostics_router, DiagnosticsState};
pub use recursive::{business_router, BusinessState};
pub use server::{HttpServer, ServerError};
