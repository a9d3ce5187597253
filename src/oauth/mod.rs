//! OAuth2 bearer tokens for outbound broker calls.
//!
//! # Data Flow
//! ```text
//! SERVICE_ACCOUNT_JSON
//!     → service_account.rs (parse, load signing key; fails at startup)
//!     → provider.rs (sign assertion → POST token_uri → cache Token)
//!     → token.rs (Token, TokenSource capability)
//!     → consumed by the forwarder and the startup probe
//! ```

pub mod provider;
pub mod service_account;
pub mod token;

pub use provider::TokenProvider;
pub use service_account::{ServiceAccountError, ServiceAccountKey};
pub use token::{Token, TokenError, TokenSource};
