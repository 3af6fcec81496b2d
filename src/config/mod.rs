//! Configuration management for the quote collection service
//!
//! This module handles configuration loading from environment variables or a
//! TOML file, validation, and default values.

pub mod app;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, SenderSettings, ServiceSettings, SmtpSettings};
