//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request span, credential gate)
//!     → forwarder.rs (token, Host/Authorization rewrite)
//!     → transport.rs (send to broker, stream response back)
//!     → Send to client
//! ```

pub mod forwarder;
pub mod request;
pub mod server;
pub mod target;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use forwarder::RequestForwarder;
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
pub use target::{BackendTarget, TargetError};
pub use transport::{HttpTransport, ReqwestTransport, TransportError};
