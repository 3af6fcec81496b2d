//! Error types for the quote collection service
//!
//! Plumbing code (config loading, startup) uses anyhow; the request path uses
//! the typed `QuoteError` so the handler can tell what went wrong.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Errors raised while processing a quote submission
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("Mail configuration error: {message}")]
    Configuration { message: String },

    #[error("Mail transport failed: {message}")]
    Transport { message: String },

    #[error("Invalid quote payload: {message}")]
    InvalidPayload { message: String },

    #[error("Internal service error: {message}")]
    Internal { message: String },
}
