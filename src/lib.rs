//! Authenticating proxy for a GCP service broker.
//!
//! Callers present one static Basic-auth credential; admitted requests are
//! forwarded to the broker with a Google service-account bearer token in
//! place of their `Authorization` header.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod oauth;
pub mod observability;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::{HttpServer, RequestForwarder};
pub use lifecycle::{Shutdown, StartupProbe};
pub use oauth::TokenProvider;
pub use security::CredentialGate;
