//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of tunables (serde handles syntactic)
//! - Validate value ranges (timeouts > 0)
//! - Check addresses and paths are well-formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("broker.catalog_path must start with '/': {0}")]
    CatalogPath(String),

    #[error("broker.api_version must not be empty")]
    EmptyApiVersion,

    #[error("observability.metrics_address must be a socket address: {0}")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let timeouts = [
        ("connect_secs", config.timeouts.connect_secs),
        ("request_secs", config.timeouts.request_secs),
        ("token_secs", config.timeouts.token_secs),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    if !config.broker.catalog_path.starts_with('/') {
        errors.push(ValidationError::CatalogPath(config.broker.catalog_path.clone()));
    }

    if config.broker.api_version.trim().is_empty() {
        errors.push(ValidationError::EmptyApiVersion);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
