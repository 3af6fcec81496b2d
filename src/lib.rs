//! Quote Collection - quote intake microservice
//!
//! This crate receives quote submissions over HTTP, renders them into an HTML
//! notification and forwards it to an admin inbox through an SMTP relay.

pub mod config;
pub mod email;
pub mod error;
pub mod metrics;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{QuoteError, Result};
pub use types::*;

// Re-export key components
pub use email::{MailTransport, OutgoingEmail, QuoteMailer, SmtpMailTransport};
pub use service::{create_router, AppState, HttpServer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
