//! Service account credentials and JWT assertions.
//!
//! A service account JSON bundle is parsed and its private key loaded once,
//! up front, so a bad credential is reported at startup and never from
//! inside a token request.

use std::time::Duration;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token endpoint used when the bundle omits `token_uri`.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Lifetime requested for each signed assertion.
pub const ASSERTION_LIFETIME: Duration = Duration::from_secs(3600);

/// `iat` is backdated by this much to tolerate clock drift with the issuer.
const CLOCK_SKEW: Duration = Duration::from_secs(10);

/// Errors parsing a service account bundle.
#[derive(Debug, Error)]
pub enum ServiceAccountError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("'type' field is \"{0}\" (expected \"service_account\")")]
    WrongType(String),

    #[error("missing '{0}' field")]
    MissingField(&'static str),

    #[error("invalid private key: {0}")]
    PrivateKey(#[source] jsonwebtoken::errors::Error),
}

#[derive(Deserialize)]
struct ServiceAccountFile {
    #[serde(rename = "type", default)]
    key_type: String,
    #[serde(default)]
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    client_email: String,
    #[serde(default)]
    token_uri: Option<String>,
}

/// Claims of a JWT bearer grant assertion (RFC 7523).
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
}

/// A parsed service account, ready to sign assertions.
pub struct ServiceAccountKey {
    client_email: String,
    private_key_id: Option<String>,
    token_uri: String,
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Parse a service account JSON bundle.
    pub fn from_json(raw: &str) -> Result<Self, ServiceAccountError> {
        let file: ServiceAccountFile = serde_json::from_str(raw)?;

        if file.key_type != "service_account" {
            return Err(ServiceAccountError::WrongType(file.key_type));
        }
        if file.client_email.is_empty() {
            return Err(ServiceAccountError::MissingField("client_email"));
        }
        if file.private_key.is_empty() {
            return Err(ServiceAccountError::MissingField("private_key"));
        }

        let encoding_key = EncodingKey::from_rsa_pem(file.private_key.as_bytes())
            .map_err(ServiceAccountError::PrivateKey)?;

        let token_uri = file
            .token_uri
            .filter(|uri| !uri.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        Ok(Self {
            client_email: file.client_email,
            private_key_id: file.private_key_id.filter(|id| !id.is_empty()),
            token_uri,
            encoding_key,
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// Claims for an assertion issued at `now` (seconds since the epoch).
    pub fn claims(&self, scope: &str, now: u64) -> AssertionClaims {
        let iat = now.saturating_sub(CLOCK_SKEW.as_secs());
        AssertionClaims {
            iss: self.client_email.clone(),
            scope: scope.to_string(),
            aud: self.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME.as_secs(),
        }
    }

    /// Sign an RS256 assertion for the given scope.
    pub fn sign_assertion(
        &self,
        scope: &str,
        now: u64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();
        encode(&header, &self.claims(scope, now), &self.encoding_key)
    }
}
