//! Configuration schema definitions.
//!
//! Everything except the listener ports can come from an optional TOML file.
//! Ports are always read from the environment (see `loader.rs`).

use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

/// Root configuration for the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Business listener (recursive route).
    pub business: ListenerConfig,

    /// Diagnostics listener (health and metrics scrape).
    pub diagnostics: ListenerConfig,

    /// Recursive call settings.
    pub recursion: RecursionConfig,

    /// Shutdown coordination.
    pub shutdown: ShutdownConfig,

    /// External StatsD client.
    pub statsd: StatsdConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Address the recursive handler calls back into.
    pub fn loopback_addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], self.business.port))
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Always taken from the environment.
    #[serde(skip)]
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
        }
    }
}

impl ListenerConfig {
    /// Full bind address as a string, suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Recursive self-call configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecursionConfig {
    /// Depth at which the handler stops calling itself.
    pub max_depth: i64,

    /// Timeout for the outgoing call in milliseconds (0 = no timeout).
    pub call_timeout_ms: u64,
}

impl Default for RecursionConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            call_timeout_ms: 30_000,
        }
    }
}

impl RecursionConfig {
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_ms > 0).then(|| Duration::from_millis(self.call_timeout_ms))
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Deadline shared by both servers, in seconds.
    pub timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

impl ShutdownConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// StatsD client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsdConfig {
    /// UDP address of the StatsD agent.
    pub address: String,

    /// Prefix prepended to every metric name.
    pub namespace: String,
}

impl Default for StatsdConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8125".to_string(),
            namespace: "grahovac".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line (production).
    Json,
    /// Multi-line human readable output (development).
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }
}
