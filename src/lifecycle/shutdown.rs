//! Per-server shutdown.
//!
//! A [`ServerHandle`] owns one spawned [`HttpServer`]: the broadcast that
//! asks it to drain, the supervisor that reports how it ended, and the abort
//! handle used when it misses the deadline.

use std::any::Any;

use tokio::sync::{broadcast, mpsc};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::Instrument;

use crate::http::{HttpServer, ServerError};

/// How a server ended after [`ServerHandle::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Drained,
    Aborted,
}

/// A running server plus the means to stop it.
pub struct ServerHandle {
    name: &'static str,
    trigger: broadcast::Sender<()>,
    supervisor: JoinHandle<()>,
    serving: AbortHandle,
}

impl ServerHandle {
    /// Spawn `server`. Its failure (bind, serve or panic) goes to `errors`;
    /// a full or closed channel drops it.
    pub fn spawn(server: HttpServer, errors: mpsc::Sender<ServerError>) -> Self {
        let name = server.name();
        let (trigger, shutdown) = broadcast::channel(1);
        let serving = tokio::spawn(server.run(shutdown).in_current_span());
        let abort = serving.abort_handle();

        let supervisor = tokio::spawn(
            async move {
                let failure = match serving.await {
                    Ok(Ok(())) => return,
                    Ok(Err(e)) => e,
                    Err(e) if e.is_panic() => ServerError::Panicked {
                        listener: name,
                        message: panic_message(e.into_panic()),
                    },
                    Err(_) => return,
                };
                if errors.try_send(failure).is_err() {
                    tracing::debug!(listener = name, "Error channel full or closed, dropping server error");
                }
            }
            .in_current_span(),
        );

        Self {
            name,
            trigger,
            supervisor,
            serving: abort,
        }
    }

    /// Ask the server to drain and wait until `deadline`, then abort it.
    pub async fn stop(self, deadline: Instant) -> StopOutcome {
        // No receiver left means the server already returned.
        let _ = self.trigger.send(());

        match tokio::time::timeout_at(deadline, self.supervisor).await {
            Ok(_) => {
                tracing::info!(listener = self.name, "Server stopped");
                StopOutcome::Drained
            }
            Err(_) => {
                tracing::error!(
                    listener = self.name,
                    "Couldn't stop {} server before the deadline, aborting",
                    self.name
                );
                self.serving.abort();
                StopOutcome::Aborted
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
