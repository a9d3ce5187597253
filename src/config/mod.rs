//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional tunables file (TOML)
//!     → loader.rs (parse & deserialize)
//! environment (PORT, USERNAME, PASSWORD, BROKER_URL, SERVICE_ACCOUNT_JSON)
//!     → loader.rs (overlay, report missing names in fixed order)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All tunables have defaults so the file is optional
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ProxyConfig;
pub use schema::{
    BrokerConfig, CredentialsConfig, ForwardingConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, TimeoutConfig,
};
