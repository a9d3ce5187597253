//! Shared utilities for integration tests.
//!
//! Mock broker and token endpoint run in-process on ephemeral ports.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Form, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const FIXTURE: &str = include_str!("../fixtures/service_account.json");

/// Access token issued by the mock token endpoint.
pub const ISSUED_TOKEN: &str = "integration-token";

/// Serve `router` on an ephemeral localhost port.
pub async fn spawn_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// The fixture service account with `token_uri` pointed elsewhere.
pub fn service_account_json(token_uri: &str) -> String {
    let mut value: Value = serde_json::from_str(FIXTURE).unwrap();
    value["token_uri"] = Value::String(token_uri.to_string());
    value.to_string()
}

pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

/// Start a token endpoint at `/token` that always issues [`ISSUED_TOKEN`].
///
/// Returns the endpoint URL and the number of exchanges served.
pub async fn start_token_endpoint() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));

    async fn issue(
        State(hits): State<Arc<AtomicUsize>>,
        Form(form): Form<Vec<(String, String)>>,
    ) -> impl IntoResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        let grant_ok = form.iter().any(|(k, v)| {
            k == "grant_type" && v == "urn:ietf:params:oauth:grant-type:jwt-bearer"
        });
        if !grant_ok {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "unsupported_grant_type"})));
        }
        (
            StatusCode::OK,
            Json(json!({
                "access_token": ISSUED_TOKEN,
                "token_type": "Bearer",
                "expires_in": 3600
            })),
        )
    }

    let router = Router::new()
        .route("/token", post(issue))
        .with_state(hits.clone());
    let addr = spawn_router(router).await;
    (format!("http://{}/token", addr), hits)
}

/// A request as the mock broker saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct BrokerLog(Arc<Mutex<Vec<SeenRequest>>>);

impl BrokerLog {
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.0.lock().unwrap().clone()
    }
}

/// Start a broker that requires the issued bearer token and echoes the path.
pub async fn start_mock_broker() -> (SocketAddr, BrokerLog) {
    let log = BrokerLog::default();

    async fn handle(
        State(log): State<BrokerLog>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: String,
    ) -> impl IntoResponse {
        log.0.lock().unwrap().push(SeenRequest {
            method,
            uri: uri.clone(),
            headers: headers.clone(),
            body,
        });

        let expected = format!("Bearer {}", ISSUED_TOKEN);
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == expected)
            .unwrap_or(false);
        if !authorized {
            return (StatusCode::UNAUTHORIZED, [("x-mock-broker", "1")], "bad token".to_string());
        }

        if uri.path() == "/v2/catalog" {
            return (StatusCode::OK, [("x-mock-broker", "1")], "{\"services\":[]}".to_string());
        }
        (
            StatusCode::CREATED,
            [("x-mock-broker", "1")],
            format!("broker saw {}", uri.path()),
        )
    }

    let router = Router::new().fallback(handle).with_state(log.clone());
    let addr = spawn_router(router).await;
    (addr, log)
}

/// Start a broker that answers every request with 404 `not found`.
pub async fn start_rejecting_broker() -> SocketAddr {
    let router = Router::new().fallback(|| async { (StatusCode::NOT_FOUND, "not found") });
    spawn_router(router).await
}

/// Start a broker that waits `delay` before answering 200.
pub async fn start_slow_broker(delay: std::time::Duration) -> SocketAddr {
    let router = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        (StatusCode::OK, "too late")
    });
    spawn_router(router).await
}

/// Start a token endpoint that waits `delay` before issuing a token.
pub async fn start_slow_token_endpoint(delay: std::time::Duration) -> String {
    let router = Router::new().route(
        "/token",
        post(move || async move {
            tokio::time::sleep(delay).await;
            Json(json!({"access_token": ISSUED_TOKEN, "expires_in": 3600}))
        }),
    );
    let addr = spawn_router(router).await;
    format!("http://{}/token", addr)
}
