//! Service account token provider.
//!
//! # Responsibilities
//! - Sign JWT bearer assertions with the service account key
//! - Exchange assertions for access tokens at the token endpoint
//! - Cache the current token and refresh it when it expires
//!
//! # Design Decisions
//! - Readers load the cached token from an `ArcSwapOption` without locking
//! - Refreshes are serialized by a mutex and re-check the cache once held,
//!   so concurrent misses cost a single exchange
//! - A token is only ever replaced whole

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::TimeoutConfig;
use crate::oauth::service_account::{ServiceAccountKey, ASSERTION_LIFETIME};
use crate::oauth::token::{Token, TokenError, TokenSource};
use crate::observability::metrics;

/// Scope requested for broker access.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Grant type for JWT bearer assertions (RFC 7523).
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Fetches and caches access tokens for a service account.
pub struct TokenProvider {
    key: ServiceAccountKey,
    scope: String,
    client: reqwest::Client,
    cached: ArcSwapOption<Token>,
    refresh: Mutex<()>,
}

impl TokenProvider {
    /// Create a provider for `key`, bounding each exchange by the token timeout.
    pub fn new(key: ServiceAccountKey, timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.token_secs))
            .build()?;

        Ok(Self {
            key,
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
            client,
            cached: ArcSwapOption::empty(),
            refresh: Mutex::new(()),
        })
    }

    fn cached_token(&self) -> Option<Token> {
        self.cached
            .load_full()
            .filter(|token| !token.is_expired())
            .map(|token| Token::clone(&token))
    }

    async fn exchange(&self) -> Result<Token, TokenError> {
        let now = SystemTime::now();
        let issued_at = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let assertion = self.key.sign_assertion(&self.scope, issued_at)?;

        tracing::debug!(
            client_email = %self.key.client_email(),
            token_uri = %self.key.token_uri(),
            "Exchanging service account assertion"
        );

        let response = self
            .client
            .post(self.key.token_uri())
            .form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(TokenError::exchange)?;

        let status = response.status();
        let body = response.text().await.map_err(TokenError::exchange)?;

        if !status.is_success() {
            return Err(TokenError::exchange(format!(
                "cannot fetch token: {}\nResponse: {}",
                status, body
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| TokenError::exchange(format!("cannot fetch token: {}", e)))?;

        let lifetime = parsed
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(ASSERTION_LIFETIME);

        Token::new(parsed.access_token.unwrap_or_default(), now + lifetime)
            .ok_or(TokenError::MissingAccessToken)
    }
}

#[async_trait]
impl TokenSource for TokenProvider {
    async fn get_token(&self) -> Result<Token, TokenError> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let _guard = self.refresh.lock().await;
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        match self.exchange().await {
            Ok(token) => {
                metrics::record_token_fetch(true);
                self.cached.store(Some(Arc::new(token.clone())));
                tracing::info!("Obtained new oauth token");
                Ok(token)
            }
            Err(e) => {
                metrics::record_token_fetch(false);
                tracing::warn!(error = %e, "Token exchange failed");
                Err(e)
            }
        }
    }
}
