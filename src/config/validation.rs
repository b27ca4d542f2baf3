//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and listener conflicts.
//! All problems are reported at once rather than stopping at the first.

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} port must be non-zero")]
    ZeroPort(&'static str),

    #[error("business and diagnostics listeners share port {0}")]
    PortConflict(u16),

    #[error("max_depth must be at least 1, got {0}")]
    MaxDepth(i64),

    #[error("shutdown timeout must be greater than zero")]
    ShutdownTimeout,

    #[error("statsd address must not be empty")]
    StatsdAddress,
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.business.port == 0 {
        errors.push(ValidationError::ZeroPort("business"));
    }
    if config.diagnostics.port == 0 {
        errors.push(ValidationError::ZeroPort("diagnostics"));
    }
    if config.business.port != 0 && config.business.port == config.diagnostics.port {
        errors.push(ValidationError::PortConflict(config.business.port));
    }
    if config.recursion.max_depth < 1 {
        errors.push(ValidationError::MaxDepth(config.recursion.max_depth));
    }
    if config.shutdown.timeout_secs == 0 {
        errors.push(ValidationError::ShutdownTimeout);
    }
    if config.statsd.address.trim().is_empty() {
        errors.push(ValidationError::StatsdAddress);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
