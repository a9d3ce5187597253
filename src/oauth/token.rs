//! Bearer tokens and the capability that supplies them.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use thiserror::Error;

/// Tokens are treated as expired this long before their nominal expiry.
pub const EXPIRY_SKEW: Duration = Duration::from_secs(10);

/// Boxed underlying cause of a failed exchange.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An OAuth2 access token.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    access_token: String,
    expiry: SystemTime,
}

impl Token {
    /// Create a token. Returns `None` for an empty access token.
    pub fn new(access_token: impl Into<String>, expiry: SystemTime) -> Option<Self> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return None;
        }
        Some(Self {
            access_token,
            expiry,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expiry(&self) -> SystemTime {
        self.expiry
    }

    /// Value for the `Authorization` header.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Whether the token is at (or within `EXPIRY_SKEW` of) its expiry.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now + EXPIRY_SKEW >= self.expiry
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Failures while obtaining a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The exchange with the token endpoint failed.
    #[error("Failed obtaining oauth token: {0}")]
    Exchange(#[source] BoxError),

    /// The assertion could not be signed.
    #[error("Failed obtaining oauth token: failed to sign assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// The endpoint answered successfully but without an access token.
    #[error("Failed obtaining oauth token: Missing access_token in oauth response")]
    MissingAccessToken,
}

impl TokenError {
    /// Wrap any error (or message) as an exchange failure.
    pub fn exchange(cause: impl Into<BoxError>) -> Self {
        Self::Exchange(cause.into())
    }
}

/// Supplies bearer tokens for outbound broker calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn get_token(&self) -> Result<Token, TokenError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_access_token_rejected() {
        assert!(Token::new("", SystemTime::now()).is_none());
    }

    #[test]
    fn test_expiry_with_skew() {
        let now = SystemTime::now();
        let token = Token::new("abc", now + Duration::from_secs(60)).unwrap();
        assert!(!token.is_expired_at(now));
        assert!(token.is_expired_at(now + Duration::from_secs(50)));
        assert!(token.is_expired_at(now + Duration::from_secs(61)));
    }

    #[test]
    fn test_bearer_header() {
        let token = Token::new("my-gcp-token", SystemTime::now()).unwrap();
        assert_eq!(token.bearer_header(), "Bearer my-gcp-token");
    }

    #[test]
    fn test_debug_redacts() {
        let token = Token::new("super-secret", SystemTime::now()).unwrap();
        assert!(!format!("{:?}", token).contains("super-secret"));
    }

    #[test]
    fn test_error_messages() {
        let err = TokenError::exchange("oops");
        assert_eq!(err.to_string(), "Failed obtaining oauth token: oops");

        let err = TokenError::MissingAccessToken;
        assert!(err.to_string().contains("Missing access_token"));
    }
}
