//! HTTP Server
//!
//! Owns the listener, the middleware stack, and graceful shutdown. Handler
//! and route logic lives in the sibling modules.

use super::handlers::AppState;
use super::middleware::{create_cors_layer, request_id_middleware};
use super::routes::create_router;
use crate::config::ServerConfig;
use crate::errors::{TambolaError, TambolaResult};
use axum::middleware;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Network settings for one server instance.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl From<&ServerConfig> for ServerSettings {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            host: cfg.host.clone(),
            port: cfg.port,
            allowed_origins: cfg.allowed_origins.clone(),
            request_timeout: Duration::from_secs(cfg.request_timeout_secs),
        }
    }
}

/// The assembled HTTP server, ready to run.
pub struct ApiServer {
    settings: ServerSettings,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(settings: ServerSettings, state: Arc<AppState>) -> Self {
        Self { settings, state }
    }

    /// Bind and serve until a shutdown signal arrives.
    pub async fn run(self) -> TambolaResult<()> {
        // Layer order matters: the request id must exist before anything
        // that logs or responds, and the timeout must wrap the handlers
        // but not the trace span.
        let app = create_router(self.state)
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(self.settings.request_timeout))
            .layer(create_cors_layer(self.settings.allowed_origins.clone()))
            .layer(middleware::from_fn(request_id_middleware));

        let addr = format!("{}:{}", self.settings.host, self.settings.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TambolaError::Configuration(format!("failed to bind {}: {}", addr, e)))?;

        info!("🚀 Tambola server listening on {}", addr);
        info!("🌐 WebSocket rooms available at ws://{}/ws?gameId=<id>", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| TambolaError::Configuration(format!("server error: {}", e)))?;

        info!("👋 server stopped");
        Ok(())
    }
}

/// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
