//! Per-request tracing span.
//!
//! Every inbound request gets a `request_id`, taken from `x-request-id`
//! when the caller sent one and generated otherwise. The id lives on the
//! span only; the forwarded request is not modified.

use axum::http::Request;
use tracing::Span;
use uuid::Uuid;

/// Header consulted for a caller-supplied request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The caller's request id, or a fresh UUID v4.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// `make_span_with` hook for `TraceLayer`.
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(request),
        method = %request.method(),
        path = %request.uri().path(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_caller_request_id() {
        let request = Request::builder()
            .header(X_REQUEST_ID, "abc-123")
            .body(())
            .unwrap();
        assert_eq!(request_id(&request), "abc-123");
    }

    #[test]
    fn test_generates_uuid_when_absent() {
        let request = Request::builder().body(()).unwrap();
        let id = request_id(&request);
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(id, request_id(&request));
    }
}
