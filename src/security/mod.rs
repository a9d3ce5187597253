//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → basic_auth.rs (configured username/password, else 401)
//!     → Pass to forwarder
//! ```
//!
//! # Design Decisions
//! - Fail closed: absent or malformed credentials are a mismatch
//! - Constant-time comparison of both fields
//! - No token or network work before the gate admits a request

pub mod basic_auth;

pub use basic_auth::{credential_gate_middleware, CredentialGate, Credentials, UNAUTHORIZED_BODY};
