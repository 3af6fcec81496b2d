//! HTTP server hosting the quote, health and metrics endpoints

use crate::service::app::{AppState, ServiceError};
use crate::service::routes::create_router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Port to bind to (0 picks a free port)
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Quote intake server with graceful shutdown
pub struct HttpServer {
    config: HttpServerConfig,
    state: AppState,
    shutdown_tx: broadcast::Sender<()>,
}

impl HttpServer {
    /// Create a new server
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            state,
            shutdown_tx,
        }
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener, ServiceError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| ServiceError::Configuration {
                message: format!("Invalid HTTP server address: {}", e),
            })?;

        TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::Server {
                message: format!("Failed to bind {}: {}", addr, e),
            })
    }

    /// Serve on an already bound listener until `stop` is called
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServiceError> {
        let addr = listener.local_addr().map_err(|e| ServiceError::Server {
            message: e.to_string(),
        })?;
        let app = create_router(self.state.clone());

        info!("HTTP server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server shutdown signal received");
            })
            .await
            .map_err(|e| ServiceError::Server {
                message: e.to_string(),
            })?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Stop the server
    pub fn stop(&self) {
        info!("Stopping HTTP server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }
    }
}
