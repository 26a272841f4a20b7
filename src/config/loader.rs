//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::access::AllowList;
use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override file values.
pub const ENV_ALLOWLIST_ORIGIN: &str = "ALLOWLIST_ORIGIN";
pub const ENV_ALLOWLIST_DESTINATION: &str = "ALLOWLIST_DESTINATION";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_BIND_ADDRESS: &str = "BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ProxyConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the effective configuration: file (if any), then environment
/// overrides, then validation. Used at startup and on every reload.
pub fn load_with_env(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    load_with_overrides(path, |key| std::env::var(key).ok())
}

/// Same as [`load_with_env`] with an explicit override lookup.
///
/// Validation runs once, on the merged result, so an override can repair a
/// file value that would be rejected on its own.
pub fn load_with_overrides<F>(path: Option<&Path>, lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    apply_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply overrides from a key lookup (normally the process environment).
pub fn apply_overrides<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_ALLOWLIST_ORIGIN) {
        config.access.allowlist_origin = AllowList::from_delimited(&value);
    }
    if let Some(value) = lookup(ENV_ALLOWLIST_DESTINATION) {
        config.access.allowlist_destination = AllowList::from_delimited(&value);
    }
    if let Some(value) = lookup(ENV_LOG_LEVEL) {
        config.observability.log_level = value;
    }
    if let Some(value) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = value;
    }
}
