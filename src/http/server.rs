//! HTTP server wrapper shared by both listeners.
//!
//! # Responsibilities
//! - Bind the listener (inside the server task, so bind failures surface as
//!   server errors rather than startup errors)
//! - Serve an Axum router until the shutdown broadcast fires
//! - Report failures as typed [`ServerError`]s

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Error type for listener lifecycles.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{listener} server failed to bind {address}: {source}")]
    Bind {
        listener: &'static str,
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{listener} server failed: {source}")]
    Serve {
        listener: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{listener} server panicked: {message}")]
    Panicked {
        listener: &'static str,
        message: String,
    },
}

impl ServerError {
    /// Name of the listener that failed.
    pub fn listener(&self) -> &'static str {
        match self {
            ServerError::Bind { listener, .. }
            | ServerError::Serve { listener, .. }
            | ServerError::Panicked { listener, .. } => listener,
        }
    }
}

/// A named HTTP server bound to one address.
pub struct HttpServer {
    name: &'static str,
    bind_address: String,
    router: Router,
}

impl HttpServer {
    pub fn new(name: &'static str, bind_address: impl Into<String>, router: Router) -> Self {
        Self {
            name,
            bind_address: bind_address.into(),
            router,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bind and serve until `shutdown` fires (or its sender is dropped).
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let name = self.name;
        let listener = TcpListener::bind(&self.bind_address)
            .await
            .map_err(|source| ServerError::Bind {
                listener: name,
                address: self.bind_address.clone(),
                source,
            })?;

        match listener.local_addr() {
            Ok(addr) => tracing::info!(listener = name, address = %addr, "HTTP server starting"),
            Err(e) => tracing::warn!(listener = name, error = %e, "HTTP server starting, local address unknown"),
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::debug!(listener = name, "Graceful shutdown requested");
            })
            .await
            .map_err(|source| ServerError::Serve {
                listener: name,
                source,
            })?;

        tracing::info!(listener = name, "HTTP server stopped");
        Ok(())
    }
}
