//! Request forwarding to the broker.
//!
//! # Responsibilities
//! - Obtain a bearer token for every admitted request
//! - Re-target the request at the broker, rewriting `Host`
//! - Replace `Authorization` with the bearer credential
//! - Relay the broker's response status, headers and body
//!
//! # Design Decisions
//! - Token failure short-circuits: nothing is sent to the broker
//! - Hop-by-hop headers are dropped in both directions
//! - No retries; a failed exchange is reported to the caller as-is

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::http::target::BackendTarget;
use crate::http::transport::{HttpTransport, TransportError};
use crate::oauth::TokenSource;
use crate::observability::metrics;

/// Body of the 502 sent when no token could be obtained.
pub const TOKEN_FAILURE_BODY: &str = "Error retrieving OAuth token";

/// Body of the 502 sent when the broker could not be reached.
pub const BROKER_FAILURE_BODY: &str = "Error communicating with broker";

/// Body of the 504 sent when the broker did not answer in time.
pub const BROKER_TIMEOUT_BODY: &str = "Broker request timed out";

/// Connection-scoped headers, never forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    for name in listed {
        headers.remove(name.as_str());
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Forwards admitted requests to the configured broker.
#[derive(Clone)]
pub struct RequestForwarder {
    backend: BackendTarget,
    transport: Arc<dyn HttpTransport>,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl RequestForwarder {
    /// Forward without touching `Authorization`.
    pub fn new(backend: BackendTarget, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            backend,
            transport,
            token_source: None,
        }
    }

    /// Inject a bearer token from `source` into every forwarded request.
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    pub fn backend(&self) -> &BackendTarget {
        &self.backend
    }

    /// Forward `request` and produce the response for the caller.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();

        let response = self.forward_inner(request).await;

        metrics::record_request(method.as_str(), response.status().as_u16(), start);
        response
    }

    async fn forward_inner(&self, request: Request<Body>) -> Response {
        let bearer = match &self.token_source {
            Some(source) => match source.get_token().await {
                Ok(token) => Some(token.bearer_header()),
                Err(e) => {
                    tracing::error!(error = %e, "Error retrieving OAuth token");
                    return (StatusCode::BAD_GATEWAY, TOKEN_FAILURE_BODY).into_response();
                }
            },
            None => None,
        };

        let outbound = match self.outbound_request(request, bearer.as_deref()) {
            Ok(outbound) => outbound,
            Err(e) => {
                tracing::error!(error = %e, "Could not build broker request");
                return (StatusCode::BAD_GATEWAY, BROKER_FAILURE_BODY).into_response();
            }
        };

        tracing::debug!(method = %outbound.method(), uri = %outbound.uri(), "Forwarding to broker");

        match self.transport.send(outbound).await {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                Response::from_parts(parts, body)
            }
            Err(TransportError::Timeout(after)) => {
                tracing::warn!(timeout = ?after, "Broker request timed out");
                (StatusCode::GATEWAY_TIMEOUT, BROKER_TIMEOUT_BODY).into_response()
            }
            Err(e) => {
                tracing::error!(error = %e, "Error communicating with broker");
                (StatusCode::BAD_GATEWAY, BROKER_FAILURE_BODY).into_response()
            }
        }
    }

    /// Rewrite an inbound request so it addresses the broker.
    ///
    /// Method, path, query and body are kept. `Host` always names the
    /// broker; `Authorization` is replaced when `bearer` is given.
    pub fn outbound_request(
        &self,
        request: Request<Body>,
        bearer: Option<&str>,
    ) -> Result<Request<Body>, axum::http::Error> {
        let (mut parts, body) = request.into_parts();

        parts.uri = self.backend.resolve(&parts.uri).as_str().parse::<Uri>()?;

        strip_hop_by_hop(&mut parts.headers);
        parts
            .headers
            .insert(header::HOST, HeaderValue::from_str(self.backend.authority())?);
        if let Some(bearer) = bearer {
            parts
                .headers
                .insert(header::AUTHORIZATION, HeaderValue::from_str(bearer)?);
        }

        Ok(Request::from_parts(parts, body))
    }
}
