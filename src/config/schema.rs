//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! Tunables derive Serde traits for deserialization from an optional TOML
//! file; the required inputs (credentials, broker URL, service account) are
//! overlaid from the environment by the loader and never serialized.

use serde::{Deserialize, Serialize};

/// Root configuration for the broker proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Backend broker settings.
    pub broker: BrokerConfig,

    /// Basic-auth credentials callers must present.
    #[serde(skip)]
    pub credentials: CredentialsConfig,

    /// Raw service account JSON used to mint bearer tokens.
    #[serde(skip)]
    pub service_account_json: String,

    /// Forwarding behaviour.
    pub forwarding: ForwardingConfig,

    /// Timeouts for outbound calls.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to bind. Overridden by `PORT`.
    pub port: u16,
}

impl ListenerConfig {
    /// Socket address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Backend broker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Absolute broker URL. Set from `BROKER_URL`.
    #[serde(skip)]
    pub url: String,

    /// Path probed at startup.
    pub catalog_path: String,

    /// Value of the `x-broker-api-version` header sent by the probe.
    pub api_version: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            catalog_path: "/v2/catalog".to_string(),
            api_version: "2.14".to_string(),
        }
    }
}

/// Static Basic-auth credentials.
#[derive(Clone, Default)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Forwarding behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Overwrite `Authorization` with a service-account bearer token.
    pub inject_token: bool,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self { inject_token: true }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Broker request timeout (forwarding and startup probe) in seconds.
    pub request_secs: u64,

    /// OAuth token exchange timeout in seconds.
    pub token_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            token_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log line format.
    pub log_format: LogFormat,

    /// Filter used when `RUST_LOG` is not set.
    pub log_filter: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus scrape address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_filter: "broker_proxy=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
