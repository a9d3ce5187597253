//! Broker proxy binary.
//!
//! ```text
//!     Client (Basic auth)
//!     ─────────────────────▶ credential gate ──▶ forwarder ──▶ Broker
//!                                                   │
//!                                                   ▼
//!                                            token provider ──▶ OAuth token endpoint
//! ```
//!
//! Startup order: configuration, logging, metrics, service account, token
//! provider, transport, broker probe, listener. Any failure before the
//! listener is bound is printed to stderr and exits non-zero.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tokio::net::TcpListener;

use broker_proxy::config::{self, ConfigError};
use broker_proxy::http::{HttpServer, ReqwestTransport, RequestForwarder};
use broker_proxy::lifecycle::{spawn_signal_handler, Shutdown, StartupError, StartupProbe};
use broker_proxy::oauth::{ServiceAccountError, ServiceAccountKey, TokenProvider};
use broker_proxy::observability::{logging, metrics};
use broker_proxy::security::{CredentialGate, Credentials};

#[derive(Debug, Parser)]
#[command(name = "broker-proxy", version, about = "Authenticating proxy for a GCP service broker")]
struct Cli {
    /// Optional TOML file with tunables.
    #[arg(long, env = "BROKER_PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum BootError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid metrics address {0}")]
    MetricsAddress(String),

    #[error("Failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Invalid SERVICE_ACCOUNT_JSON: {0}")]
    ServiceAccount(#[from] ServiceAccountError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed startup checks: {0}")]
    Startup(#[from] StartupError),

    #[error("Failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), BootError> {
    let config = config::load_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!(
        broker = %config.broker.url,
        inject_token = config.forwarding.inject_token,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| BootError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let backend = config::loader::backend_target(&config)?;
    let key = ServiceAccountKey::from_json(&config.service_account_json)?;
    tracing::info!(client_email = %key.client_email(), "Loaded service account");

    let tokens = Arc::new(TokenProvider::new(key, &config.timeouts)?);
    let transport = Arc::new(ReqwestTransport::new(&config.timeouts)?);

    StartupProbe::new(backend.clone(), tokens.clone(), transport.clone())
        .with_broker_config(&config.broker)
        .perform()
        .await?;
    tracing::info!("Startup checks passed");

    let mut forwarder = RequestForwarder::new(backend, transport);
    if config.forwarding.inject_token {
        forwarder = forwarder.with_token_source(tokens);
    }
    let gate = CredentialGate::new(Credentials::from(&config.credentials));
    let server = HttpServer::new(forwarder, gate);

    tracing::info!("About to listen on port {}", config.listener.port);
    let addr = config.listener.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| BootError::Bind { addr, source })?;

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    server.run(listener, shutdown_rx).await.map_err(BootError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
