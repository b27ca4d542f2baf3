//! DogStatsD client over UDP.
//!
//! Lines are sent unbuffered, one datagram per metric:
//! `<namespace>.<name>:<value>|c[|@<rate>][|#tag1,tag2]`.

use std::net::SocketAddr;

use rand::Rng;
use thiserror::Error;
use tokio::net::UdpSocket;

#[derive(Debug, Error)]
pub enum StatsdError {
    #[error("cannot resolve statsd address {0}")]
    Resolve(String),

    #[error("statsd socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client for an external StatsD agent.
#[derive(Debug)]
pub struct StatsdClient {
    socket: UdpSocket,
    target: SocketAddr,
    namespace: String,
}

impl StatsdClient {
    /// Resolve `address` and open a connected UDP socket towards it.
    pub async fn connect(address: &str, namespace: impl Into<String>) -> Result<Self, StatsdError> {
        let target = tokio::net::lookup_host(address)
            .await
            .map_err(|_| StatsdError::Resolve(address.to_string()))?
            .next()
            .ok_or_else(|| StatsdError::Resolve(address.to_string()))?;

        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(target).await?;

        tracing::debug!(target_addr = %target, "StatsD client connected");

        Ok(Self {
            socket,
            target,
            namespace: namespace.into(),
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Increment a counter by one.
    pub async fn incr(&self, name: &str, tags: &[&str], rate: f64) -> Result<(), StatsdError> {
        self.count(name, 1, tags, rate).await
    }

    /// Add `value` to a counter, sampled at `rate`.
    pub async fn count(
        &self,
        name: &str,
        value: i64,
        tags: &[&str],
        rate: f64,
    ) -> Result<(), StatsdError> {
        if rate < 1.0 && rand::thread_rng().gen::<f64>() >= rate {
            return Ok(());
        }
        let line = format_count(&self.namespace, name, value, tags, rate);
        self.socket.send(line.as_bytes()).await?;
        Ok(())
    }
}

fn format_count(namespace: &str, name: &str, value: i64, tags: &[&str], rate: f64) -> String {
    let mut line = if namespace.is_empty() {
        format!("{name}:{value}|c")
    } else {
        format!("{namespace}.{name}:{value}|c")
    };
    if rate < 1.0 {
        line.push_str(&format!("|@{rate}"));
    }
    if !tags.is_empty() {
        line.push_str("|#");
        line.push_str(&tags.join(","));
    }
    line
}
