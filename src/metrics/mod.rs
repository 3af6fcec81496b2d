//! Metrics for the quote collection service
//!
//! Prometheus counters for submissions and email outcomes, exposed on
//! `/metrics` by the HTTP server.

pub mod collector;

pub use collector::{MetricsCollector, QuoteMetrics};
