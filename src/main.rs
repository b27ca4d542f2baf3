//! grahovac
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!                 │                  grahovac                    │
//!   GET /?deep=n  │  ┌────────────┐   GET /?deep=n+1             │
//!  ───────────────┼─▶│  business  │──────────────┐               │
//!                 │  │  listener  │◀─────────────┘ (loopback)    │
//!                 │  └────────────┘                              │
//!   /health       │  ┌────────────┐   ┌─────────┐  ┌──────────┐  │
//!  ───────────────┼─▶│diagnostics │──▶│ metrics │  │  statsd  │──┼──▶ UDP agent
//!   /prom         │  │  listener  │   └─────────┘  └──────────┘  │
//!                 │  └────────────┘                              │
//!                 │        lifecycle: signals / shutdown         │
//!                 └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::Instrument;

use grahovac::config::{self, AppConfig, ObservabilityConfig};
use grahovac::lifecycle::Coordinator;
use grahovac::observability::{logging, Metrics, StatsdClient};

#[derive(Parser)]
#[command(name = "grahovac", version)]
#[command(about = "Recursive self-calling HTTP service with a diagnostics listener", long_about = None)]
struct Cli {
    /// Optional TOML file with non-port settings.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(config) => {
            logging::init(&config.observability);
            config
        }
        Err(e) => {
            logging::init(&ObservabilityConfig::default());
            logging::root_span().in_scope(|| tracing::error!(error = %e, "Configuration is invalid"));
            return Err(e.into());
        }
    };

    // Created after `init` so the span is enabled.
    run(config).instrument(logging::root_span()).await
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("The application is starting...");

    let statsd = match StatsdClient::connect(&config.statsd.address, config.statsd.namespace.clone()).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, address = %config.statsd.address, "Couldn't connect to statsd");
            return Err(e.into());
        }
    };

    tracing::info!(
        business_port = config.business.port,
        diagnostics_port = config.diagnostics.port,
        max_depth = config.recursion.max_depth,
        call_timeout_ms = config.recursion.call_timeout_ms,
        shutdown_timeout_secs = config.shutdown.timeout_secs,
        "Configuration is read successfully"
    );

    let coordinator = Coordinator::from_config(&config, Metrics::new(), Arc::new(statsd));
    let reason = coordinator.run().await;

    tracing::info!(reason = %reason, "The application is stopped.");
    Ok(())
}
