//! In-process fakes for the transport and token capabilities.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, Response, StatusCode, Uri},
};

use crate::http::transport::{HttpTransport, TransportError};
use crate::oauth::token::{Token, TokenError, TokenSource};

/// A request as the transport saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

type Responder = Box<dyn Fn() -> Result<Response<Body>, TransportError> + Send + Sync>;

pub struct FakeTransport {
    requests: Mutex<Vec<Recorded>>,
    respond: Responder,
}

impl FakeTransport {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn() -> Result<Response<Body>, TransportError> + Send + Sync + 'static,
    {
        Self {
            requests: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    /// Always answer with `status` and `body`.
    pub fn returning(status: StatusCode, body: &'static str) -> Self {
        Self::new(move || {
            let mut response = Response::new(Body::from(body));
            *response.status_mut() = status;
            Ok(response)
        })
    }

    /// Always fail with `InvalidRequest(message)`.
    pub fn failing(message: &'static str) -> Self {
        Self::new(move || Err(TransportError::InvalidRequest(message.to_string())))
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        self.requests.lock().unwrap().push(Recorded {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        });
        (self.respond)()
    }
}

pub struct FakeTokenSource {
    result: Result<&'static str, &'static str>,
    calls: AtomicUsize,
}

impl FakeTokenSource {
    pub fn ok(access_token: &'static str) -> Self {
        Self {
            result: Ok(access_token),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn err(message: &'static str) -> Self {
        Self {
            result: Err(message),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for FakeTokenSource {
    async fn get_token(&self) -> Result<Token, TokenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.result {
            Ok(access_token) => Token::new(access_token, SystemTime::now() + Duration::from_secs(3600))
                .ok_or(TokenError::MissingAccessToken),
            Err(message) => Err(TokenError::exchange(message)),
        }
    }
}
