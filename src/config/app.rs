//! Main application configuration
//!
//! This module defines the configuration structures for the quote collection
//! service, including environment variable loading, TOML file loading and
//! validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub smtp: SmtpSettings,
    pub sender: SenderSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Address the HTTP server binds to
    pub host: String,
    /// Port for the HTTP server
    pub port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// SMTP relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    /// Relay host name
    pub host: String,
    /// Relay port (587 for submission with STARTTLS)
    pub port: u16,
    /// Username for SMTP AUTH
    pub username: Option<String>,
    /// Password for SMTP AUTH
    pub password: Option<String>,
    /// Overrides the transport's own timeout when set
    pub timeout_seconds: Option<u64>,
}

/// Envelope settings for the notification email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderSettings {
    /// Display name on the From header
    pub from_name: String,
    /// From address; falls back to the SMTP username
    pub from_address: Option<String>,
    /// Administrative recipient of every quote
    pub admin_email: Option<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "quote-collection".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3001,
            shutdown_timeout_seconds: 10,
        }
    }
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: None,
            password: None,
            timeout_seconds: None,
        }
    }
}

impl Default for SenderSettings {
    fn default() -> Self {
        Self {
            from_name: "Dream Cleaning Bot".to_string(),
            from_address: None,
            admin_email: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Empty values count as unset, so `EMAIL_PASSWORD=` falls through to
    /// `EMAIL_PASS`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let mut config = Self::default();

        // Service settings
        if let Some(name) = var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Some(log_level) = var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Some(host) = var("HOST") {
            config.service.host = host;
        }
        if let Some(port) = var("PORT") {
            config.service.port = port
                .parse()
                .map_err(|_| anyhow!("Invalid PORT value: {}", port))?;
        }
        if let Some(timeout) = var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // SMTP settings
        if let Some(host) = var("EMAIL_HOST") {
            config.smtp.host = host;
        }
        if let Some(port) = var("EMAIL_PORT") {
            config.smtp.port = port
                .parse()
                .map_err(|_| anyhow!("Invalid EMAIL_PORT value: {}", port))?;
        }
        config.smtp.username = var("EMAIL_USER");
        config.smtp.password = var("EMAIL_PASSWORD").or_else(|| var("EMAIL_PASS"));
        if let Some(timeout) = var("EMAIL_TIMEOUT_SECONDS") {
            config.smtp.timeout_seconds = Some(
                timeout
                    .parse()
                    .map_err(|_| anyhow!("Invalid EMAIL_TIMEOUT_SECONDS value: {}", timeout))?,
            );
        }

        // Sender settings
        if let Some(from_name) = var("EMAIL_FROM_NAME") {
            config.sender.from_name = from_name;
        }
        config.sender.from_address = var("EMAIL_FROM");
        config.sender.admin_email = var("ADMIN_EMAIL");

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; missing keys take defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(raw).context("Failed to parse TOML configuration")?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get the SMTP timeout override, if any
    pub fn smtp_timeout(&self) -> Option<Duration> {
        self.smtp.timeout_seconds.map(Duration::from_secs)
    }

    /// Address the From header uses: explicit override, else the SMTP user
    pub fn from_address(&self) -> Option<&str> {
        self.sender
            .from_address
            .as_deref()
            .or(self.smtp.username.as_deref())
    }

    /// Whether enough is configured to attempt authenticated delivery
    pub fn mail_configured(&self) -> bool {
        self.smtp.username.is_some()
            && self.smtp.password.is_some()
            && self.sender.admin_email.is_some()
    }
}

/// Validate configuration values
///
/// Missing SMTP credentials are not an error here: the service must come up
/// (and report healthy) without them.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.host.is_empty() {
        return Err(anyhow!("HTTP host cannot be empty"));
    }

    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.smtp.host.is_empty() {
        return Err(anyhow!("SMTP host cannot be empty"));
    }
    if config.smtp.port == 0 {
        return Err(anyhow!("SMTP port cannot be 0"));
    }
    if config.smtp.timeout_seconds == Some(0) {
        return Err(anyhow!("SMTP timeout must be greater than 0"));
    }

    Ok(())
}
