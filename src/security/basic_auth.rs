//! Basic-auth credential gate.
//!
//! Callers must present the single configured username/password pair.
//! Anything else, including no credentials at all, is answered with 401
//! before any token or broker work happens.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use subtle::ConstantTimeEq;

use crate::config::CredentialsConfig;

/// Body of every 401 response.
pub const UNAUTHORIZED_BODY: &str = "Incorrect username/password";

/// The configured username/password pair.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Exact comparison of both fields, in constant time.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        (user_ok & pass_ok).into()
    }
}

impl From<&CredentialsConfig> for Credentials {
    fn from(config: &CredentialsConfig) -> Self {
        Self::new(config.username.clone(), config.password.clone())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Extract `(username, password)` from a Basic `Authorization` header.
///
/// Returns `None` when the header is absent or malformed.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Gate that admits only requests carrying the configured credentials.
#[derive(Debug, Clone)]
pub struct CredentialGate {
    credentials: Credentials,
}

impl CredentialGate {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Whether the request headers carry the configured credentials.
    pub fn admits(&self, headers: &HeaderMap) -> bool {
        match basic_credentials(headers) {
            Some((username, password)) => self.credentials.matches(&username, &password),
            None => false,
        }
    }
}

/// Middleware: 401 on mismatch, otherwise pass the request on untouched.
pub async fn credential_gate_middleware(
    State(gate): State<Arc<CredentialGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if gate.admits(request.headers()) {
        return next.run(request).await;
    }

    tracing::warn!(
        method = %request.method(),
        path = %request.uri().path(),
        "Rejected request with incorrect credentials"
    );
    (StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY).into_response()
}
