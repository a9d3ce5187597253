//! Configuration loading from disk and the environment.
//!
//! Tunables come from an optional TOML file. The values every deployment
//! must provide (credentials, broker URL, service account) and the port
//! are read from environment variables and overlaid on top.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::http::target::BackendTarget;

/// Required environment variables, in the order they are reported.
pub const REQUIRED_ENV_VARS: [&str; 4] = ["USERNAME", "PASSWORD", "BROKER_URL", "SERVICE_ACCOUNT_JSON"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {} environment variable(s)", .0.join(", "))]
    MissingEnv(Vec<&'static str>),

    #[error("PORT must be a valid port number: {0}")]
    InvalidPort(String),

    #[error("BROKER_URL must be a valid URL: {0}")]
    InvalidBrokerUrl(String),

    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load tunables from a TOML file.
pub fn load_tunables(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Load the full configuration: optional tunables file, then the process
/// environment.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let base = match path {
        Some(path) => load_tunables(path)?,
        None => ProxyConfig::default(),
    };
    apply_env(base, |name| std::env::var(name).ok())
}

/// Overlay environment values onto `config` and validate the result.
///
/// `lookup` abstracts the environment so callers can supply values without
/// touching process state. Empty values count as missing.
pub fn apply_env<F>(mut config: ProxyConfig, lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

    let mut missing = Vec::new();
    let mut required = |name: &'static str| {
        get(name).unwrap_or_else(|| {
            missing.push(name);
            String::new()
        })
    };

    let [username, password, broker_url, service_account] = REQUIRED_ENV_VARS;
    config.credentials.username = required(username);
    config.credentials.password = required(password);
    config.broker.url = required(broker_url);
    config.service_account_json = required(service_account);

    if !missing.is_empty() {
        return Err(ConfigError::MissingEnv(missing));
    }

    if let Some(port) = get("PORT") {
        config.listener.port = port.parse().map_err(|_| ConfigError::InvalidPort(port.clone()))?;
    }

    backend_target(&config)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse the configured broker URL.
pub fn backend_target(config: &ProxyConfig) -> Result<BackendTarget, ConfigError> {
    BackendTarget::parse(&config.broker.url)
        .map_err(|_| ConfigError::InvalidBrokerUrl(config.broker.url.clone()))
}
