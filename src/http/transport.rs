//! Outbound HTTP to the broker.
//!
//! # Responsibilities
//! - Define the `HttpTransport` capability used by the forwarder and the
//!   startup probe
//! - Provide the real implementation on top of `reqwest`
//! - Enforce connect and request timeouts
//!
//! # Design Decisions
//! - Bodies are streamed in both directions, never buffered
//! - Redirects are relayed to the caller, not followed
//! - Timeouts are distinct from other transport errors (504 vs 502)

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{Body, HttpBody},
    http::{Request, Response},
};
use thiserror::Error;

use crate::config::TimeoutConfig;

/// Errors raised before a broker response is available.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The outbound request could not be expressed.
    #[error("invalid outbound request: {0}")]
    InvalidRequest(String),

    /// The broker did not answer within the configured timeout.
    #[error("request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// Connection or protocol failure.
    #[error(transparent)]
    Request(reqwest::Error),
}

/// Sends a fully-formed request and returns the broker's response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, TransportError>;
}

/// `HttpTransport` backed by a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build a transport using the configured connect and request timeouts.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(timeouts.request_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let (parts, body) = request.into_parts();
        let url = reqwest::Url::parse(&parts.uri.to_string())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let mut outbound = self
            .client
            .request(parts.method, url)
            .headers(parts.headers);

        // An empty body must not turn into a chunked upload.
        if body.size_hint().exact() != Some(0) {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = outbound.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::Request(e)
            }
        })?;

        let status = upstream.status();
        let headers = upstream.headers().clone();

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
