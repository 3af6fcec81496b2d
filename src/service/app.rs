//! Application state shared by every request handler
//!
//! Built once at startup. Nothing in here is mutated after construction, so
//! handlers share it through cheap `Arc` clones without locking.

use crate::config::AppConfig;
use crate::email::{MailTransport, QuoteMailer, SmtpMailTransport};
use crate::metrics::MetricsCollector;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("HTTP server error: {message}")]
    Server { message: String },
}

/// Main application state containing all service components
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    config: Arc<AppConfig>,

    /// Renders and dispatches quote notifications
    mailer: Arc<QuoteMailer>,

    /// Prometheus metrics
    metrics: Arc<MetricsCollector>,
}

impl AppState {
    /// Initialize the application with the SMTP transport from configuration
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!(
            "Initializing {} with SMTP relay {}:{}",
            config.service.name, config.smtp.host, config.smtp.port
        );

        let transport =
            SmtpMailTransport::new(&config).map_err(|e| ServiceError::Configuration {
                message: e.to_string(),
            })?;

        Self::with_transport(config, Arc::new(transport))
    }

    /// Initialize the application over an arbitrary mail transport
    pub fn with_transport(
        config: AppConfig,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, ServiceError> {
        let metrics = Arc::new(
            MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            })?,
        );

        warn_if_unconfigured(&config);

        let mailer = Arc::new(QuoteMailer::new(&config, transport, metrics.clone()));

        Ok(Self {
            config: Arc::new(config),
            mailer,
            metrics,
        })
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the quote mailer
    pub fn mailer(&self) -> Arc<QuoteMailer> {
        self.mailer.clone()
    }

    /// Get the metrics collector
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }
}

/// The service still starts without mail settings; quotes are accepted but
/// their emails are dropped until they are provided.
fn warn_if_unconfigured(config: &AppConfig) {
    if config.smtp.username.is_none() {
        warn!("📧 EMAIL_USER is not set, the relay will likely reject unauthenticated mail");
    }
    if config.smtp.password.is_none() {
        warn!("📧 EMAIL_PASSWORD is not set");
    }
    if config.sender.admin_email.is_none() {
        warn!("📧 ADMIN_EMAIL is not set, quote emails will not be delivered");
    }
    if config.mail_configured() {
        info!("✅ Mail delivery configured");
    }
}
