//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (coordinator.rs):
//!     Spawn business + diagnostics servers → Listening
//!
//! Shutdown (coordinator.rs, shutdown.rs):
//!     Signal or first server error → stop diagnostics → stop business → Stopped
//!     Each ServerHandle: broadcast drain → wait until deadline → abort
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Servers bind inside their own task; a bind failure is a shutdown trigger
//! - Panics in a server task become typed errors on the same channel
//! - One deadline covers both servers

pub mod coordinator;
pub mod shutdown;
pub mod signals;

pub use coordinator::{Coordinator, LifecycleState, ShutdownReason};
pub use shutdown::{ServerHandle, StopOutcome};
pub use signals::Signal;
