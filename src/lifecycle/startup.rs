//! Startup checks.
//!
//! # Responsibilities
//! - Prove the service account can mint a token
//! - Prove the broker accepts that token, via one catalog request
//!
//! # Design Decisions
//! - Fail fast: any probe error is fatal and the listener is never bound
//! - The probe shares the forwarder's token source and transport

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use futures_util::StreamExt;
use thiserror::Error;

use crate::config::BrokerConfig;
use crate::http::target::BackendTarget;
use crate::http::transport::{HttpTransport, TransportError};
use crate::oauth::{TokenError, TokenSource};

/// Header carrying the Open Service Broker API version.
pub const BROKER_API_VERSION_HEADER: &str = "x-broker-api-version";

/// Rejection bodies longer than this are truncated in the error.
const MAX_ERROR_BODY: usize = 64 * 1024;

/// Reasons the broker check failed.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Failed to create request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("Failed to make request to the broker: {0}")]
    Unreachable(#[source] TransportError),

    #[error("Broker did not respond successfully. status: {} body: {body}", .status.as_u16())]
    Rejected { status: StatusCode, body: String },
}

/// One authenticated catalog request against the broker.
pub struct StartupProbe {
    backend: BackendTarget,
    token_source: Arc<dyn TokenSource>,
    transport: Arc<dyn HttpTransport>,
    catalog_path: String,
    api_version: String,
}

impl StartupProbe {
    pub fn new(
        backend: BackendTarget,
        token_source: Arc<dyn TokenSource>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let defaults = BrokerConfig::default();
        Self {
            backend,
            token_source,
            transport,
            catalog_path: defaults.catalog_path,
            api_version: defaults.api_version,
        }
    }

    /// Use the catalog path and API version from `[broker]`.
    pub fn with_broker_config(mut self, config: &BrokerConfig) -> Self {
        self.catalog_path = config.catalog_path.clone();
        self.api_version = config.api_version.clone();
        self
    }

    /// Run the check. `Ok` only when the broker answers exactly 200.
    pub async fn perform(&self) -> Result<(), StartupError> {
        let token = self.token_source.get_token().await?;

        let url = self.backend.join(&self.catalog_path, None);
        let request = Request::builder()
            .method(Method::GET)
            .uri(url.as_str())
            .header(header::HOST, self.backend.authority())
            .header(header::AUTHORIZATION, token.bearer_header())
            .header(BROKER_API_VERSION_HEADER, self.api_version.as_str())
            .body(Body::empty())?;

        tracing::debug!(url = %url, "Checking broker catalog");

        let response = self
            .transport
            .send(request)
            .await
            .map_err(StartupError::Unreachable)?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let body = match read_truncated(response.into_body(), MAX_ERROR_BODY).await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(error = %e, "Could not read broker rejection body");
                "Could not read body".to_string()
            }
        };
        Err(StartupError::Rejected { status, body })
    }
}

/// Read at most `limit` bytes of `body`, dropping the rest.
async fn read_truncated(body: Body, limit: usize) -> Result<String, axum::Error> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let take = chunk.len().min(limit - buf.len());
        buf.extend_from_slice(&chunk[..take]);
        if buf.len() == limit {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}
