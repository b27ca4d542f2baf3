//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::{AppConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Business listener port.
pub const ENV_PORT: &str = "PORT";
/// Diagnostics listener port.
pub const ENV_DIAG_PORT: &str = "DIAG_PORT";
pub const ENV_STATSD_ADDR: &str = "STATSD_ADDR";
pub const ENV_CALL_TIMEOUT_MS: &str = "CALL_TIMEOUT_MS";
pub const ENV_SHUTDOWN_TIMEOUT_SECS: &str = "SHUTDOWN_TIMEOUT_SECS";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file plus the process environment.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env(&mut config, &env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto a file-derived configuration.
fn apply_env<F>(config: &mut AppConfig, env: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    config.business.port = required(env, ENV_PORT)?;
    config.diagnostics.port = required(env, ENV_DIAG_PORT)?;

    if let Some(addr) = optional(env, ENV_STATSD_ADDR) {
        config.statsd.address = addr;
    }
    if let Some(ms) = optional(env, ENV_CALL_TIMEOUT_MS) {
        config.recursion.call_timeout_ms = parse(ENV_CALL_TIMEOUT_MS, ms)?;
    }
    if let Some(secs) = optional(env, ENV_SHUTDOWN_TIMEOUT_SECS) {
        config.shutdown.timeout_secs = parse(ENV_SHUTDOWN_TIMEOUT_SECS, secs)?;
    }
    if let Some(format) = optional(env, ENV_LOG_FORMAT) {
        config.observability.log_format = parse::<LogFormat>(ENV_LOG_FORMAT, format)?;
    }

    Ok(())
}

/// Empty values count as unset.
fn optional<F>(env: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    env(name).filter(|v| !v.trim().is_empty())
}

fn required<F>(env: &F, name: &'static str) -> Result<u16, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = optional(env, name).ok_or(ConfigError::Missing(name))?;
    parse(name, value)
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_ports_from_env() {
        let config = load_config_with(None, env(&[("PORT", "8080"), ("DIAG_PORT", "8585")])).unwrap();
        assert_eq!(config.business.port, 8080);
        assert_eq!(config.diagnostics.port, 8585);
        assert_eq!(config.recursion.max_depth, 5);
        assert_eq!(config.shutdown.timeout_secs, 5);
        assert_eq!(config.loopback_addr().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_missing_port_is_error() {
        let err = load_config_with(None, env(&[("DIAG_PORT", "8585")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("PORT")));

        let err = load_config_with(None, env(&[("PORT", "8080"), ("DIAG_PORT", "")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DIAG_PORT")));
    }

    #[test]
    fn test_non_numeric_port_is_error() {
        let err = load_config_with(None, env(&[("PORT", "http"), ("DIAG_PORT", "8585")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_env_overrides_file() {
        let path = std::env::temp_dir().join(format!("grahovac-config-{}.toml", std::process::id()));
        fs::write(
            &path,
            r#"
            [recursion]
            max_depth = 3
            call_timeout_ms = 100

            [statsd]
            address = "10.0.0.1:8125"

            [observability]
            log_format = "pretty"
            "#,
        )
        .unwrap();

        let config = load_config_with(
            Some(&path),
            env(&[("PORT", "9000"), ("DIAG_PORT", "9001"), ("CALL_TIMEOUT_MS", "250")]),
        )
        .unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(config.recursion.max_depth, 3);
        assert_eq!(config.recursion.call_timeout_ms, 250);
        assert_eq!(config.statsd.address, "10.0.0.1:8125");
        assert_eq!(config.statsd.namespace, "grahovac");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_validation_errors_surface() {
        let err = load_config_with(None, env(&[("PORT", "8080"), ("DIAG_PORT", "8080")])).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::PortConflict(8080)]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config_with(
            Some(Path::new("/nonexistent/grahovac.toml")),
            env(&[("PORT", "1"), ("DIAG_PORT", "2")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
