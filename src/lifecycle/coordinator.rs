//! Dual-server lifecycle coordination.
//!
//! ```text
//! Starting → Listening → ShuttingDown → Stopped
//! ```
//!
//! Both servers run as their own task. Bind failures, serve failures and
//! panics all arrive on one bounded error channel. The first error or OS
//! signal starts shutdown: diagnostics first, then business, both against a
//! single deadline. A server still running at the deadline is aborted.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::config::AppConfig;
use crate::http::{
    business_router, diagnostics, diagnostics_router, recursive, BusinessState, DiagnosticsState,
    HttpServer, LoopbackClient, ServerError,
};
use crate::lifecycle::shutdown::ServerHandle;
use crate::lifecycle::signals::{self, Signal};
use crate::observability::{Metrics, StatsdClient};

/// One slot per server; later errors are dropped once shutdown has begun.
pub const ERROR_CHANNEL_CAPACITY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Listening,
    ShuttingDown,
    Stopped,
}

/// What started the shutdown.
#[derive(Debug)]
pub enum ShutdownReason {
    Signal(Signal),
    ServerFailed(ServerError),
    SignalHandler(std::io::Error),
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal(signal) => write!(f, "received {}", signal),
            ShutdownReason::ServerFailed(e) => write!(f, "server failure: {}", e),
            ShutdownReason::SignalHandler(e) => write!(f, "signal handler failure: {}", e),
        }
    }
}

/// Owns both servers and drives them through their lifecycle.
pub struct Coordinator {
    business: HttpServer,
    diagnostics: HttpServer,
    shutdown_timeout: Duration,
    state: watch::Sender<LifecycleState>,
}

impl Coordinator {
    pub fn new(business: HttpServer, diagnostics: HttpServer, shutdown_timeout: Duration) -> Self {
        let (state, _) = watch::channel(LifecycleState::Starting);
        Self {
            business,
            diagnostics,
            shutdown_timeout,
            state,
        }
    }

    /// Wire both routers from configuration and shared observability handles.
    pub fn from_config(config: &AppConfig, metrics: Metrics, statsd: Arc<StatsdClient>) -> Self {
        let client = LoopbackClient::new(config.loopback_addr(), config.recursion.call_timeout());

        let business = HttpServer::new(
            recursive::LISTENER,
            config.business.bind_address(),
            business_router(BusinessState {
                client,
                metrics: metrics.clone(),
                max_depth: config.recursion.max_depth,
            }),
        );
        let diagnostics = HttpServer::new(
            diagnostics::LISTENER,
            config.diagnostics.bind_address(),
            diagnostics_router(DiagnosticsState { metrics, statsd }),
        );

        Self::new(business, diagnostics, config.shutdown.timeout())
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Run until SIGINT/SIGTERM or a server failure.
    pub async fn run(self) -> ShutdownReason {
        self.run_until(signals::wait_for_signal()).await
    }

    /// Run until `signal` resolves or a server failure.
    pub async fn run_until<F>(self, signal: F) -> ShutdownReason
    where
        F: Future<Output = std::io::Result<Signal>>,
    {
        let (errors_tx, mut errors_rx) = mpsc::channel(ERROR_CHANNEL_CAPACITY);

        let business = ServerHandle::spawn(self.business, errors_tx.clone());
        let diagnostics = ServerHandle::spawn(self.diagnostics, errors_tx);

        self.state.send_replace(LifecycleState::Listening);
        tracing::info!("The application is ready to listen to the user requests");

        let reason = tokio::select! {
            result = signal => match result {
                Ok(signal) => {
                    tracing::info!(signal = %signal, "Received {} from OS", signal);
                    ShutdownReason::Signal(signal)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Signal handler failed");
                    ShutdownReason::SignalHandler(e)
                }
            },
            Some(e) = errors_rx.recv() => {
                tracing::error!(listener = e.listener(), error = %e, "Received an error from a server");
                ShutdownReason::ServerFailed(e)
            }
        };

        self.state.send_replace(LifecycleState::ShuttingDown);

        let deadline = Instant::now() + self.shutdown_timeout;
        let diagnostics = diagnostics.stop(deadline).await;
        let business = business.stop(deadline).await;
        tracing::info!(diagnostics = ?diagnostics, business = ?business, "Servers stopped");

        self.state.send_replace(LifecycleState::Stopped);
        reason
    }
}
