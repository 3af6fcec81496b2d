//! Metrics collection using Prometheus
//!
//! Counts quote submissions and the fate of their notification emails.

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the quote service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Quote intake metrics
    quote_metrics: QuoteMetrics,

    /// When the collector was created
    started_at: Instant,
}

/// Quote intake metrics
#[derive(Clone)]
pub struct QuoteMetrics {
    /// Quotes received on the intake endpoint
    pub quotes_received_total: IntCounter,

    /// Quotes answered with a failure
    pub quote_failures_total: IntCounter,

    /// Notification emails by outcome (sent, failed)
    pub emails_total: IntCounterVec,

    /// Time spent handling one quote, delivery included
    pub quote_duration_seconds: Histogram,

    /// Service uptime in seconds, refreshed on scrape
    pub uptime_seconds: IntGauge,
}

impl QuoteMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let quotes_received_total = IntCounter::new(
            "quote_collection_quotes_received_total",
            "Total quote submissions received",
        )?;
        registry.register(Box::new(quotes_received_total.clone()))?;

        let quote_failures_total = IntCounter::new(
            "quote_collection_quote_failures_total",
            "Total quote submissions answered with a failure",
        )?;
        registry.register(Box::new(quote_failures_total.clone()))?;

        let emails_total = IntCounterVec::new(
            Opts::new(
                "quote_collection_emails_total",
                "Notification emails handed to the SMTP relay",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(emails_total.clone()))?;

        let quote_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "quote_collection_quote_duration_seconds",
                "Time spent handling a quote submission",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;
        registry.register(Box::new(quote_duration_seconds.clone()))?;

        let uptime_seconds =
            IntGauge::new("quote_collection_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            quotes_received_total,
            quote_failures_total,
            emails_total,
            quote_duration_seconds,
            uptime_seconds,
        })
    }
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let quote_metrics = QuoteMetrics::new(&registry)?;

        Ok(Self {
            registry,
            quote_metrics,
            started_at: Instant::now(),
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get quote metrics
    pub fn quotes(&self) -> &QuoteMetrics {
        &self.quote_metrics
    }

    pub fn record_quote_received(&self) {
        self.quote_metrics.quotes_received_total.inc();
    }

    pub fn record_quote_failed(&self) {
        self.quote_metrics.quote_failures_total.inc();
    }

    pub fn record_email_sent(&self) {
        self.quote_metrics
            .emails_total
            .with_label_values(&["sent"])
            .inc();
    }

    pub fn record_email_failed(&self) {
        self.quote_metrics
            .emails_total
            .with_label_values(&["failed"])
            .inc();
    }

    pub fn observe_quote_duration(&self, duration: Duration) {
        self.quote_metrics
            .quote_duration_seconds
            .observe(duration.as_secs_f64());
    }

    pub fn quotes_received(&self) -> u64 {
        self.quote_metrics.quotes_received_total.get()
    }

    pub fn quote_failures(&self) -> u64 {
        self.quote_metrics.quote_failures_total.get()
    }

    pub fn emails_sent(&self) -> u64 {
        self.quote_metrics
            .emails_total
            .with_label_values(&["sent"])
            .get()
    }

    pub fn emails_failed(&self) -> u64 {
        self.quote_metrics
            .emails_total
            .with_label_values(&["failed"])
            .get()
    }

    /// Encode every registered metric in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        self.quote_metrics
            .uptime_seconds
            .set(self.started_at.elapsed().as_secs() as i64);

        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        assert_eq!(collector.quotes_received(), 0);
        assert_eq!(collector.quote_failures(), 0);
        assert_eq!(collector.emails_sent(), 0);
        assert_eq!(collector.emails_failed(), 0);
    }

    #[test]
    fn test_counters() {
        let collector = MetricsCollector::new().unwrap();

        collector.record_quote_received();
        collector.record_quote_received();
        collector.record_quote_failed();
        collector.record_email_sent();
        collector.record_email_failed();
        collector.record_email_failed();

        assert_eq!(collector.quotes_received(), 2);
        assert_eq!(collector.quote_failures(), 1);
        assert_eq!(collector.emails_sent(), 1);
        assert_eq!(collector.emails_failed(), 2);
    }

    #[test]
    fn test_duration_histogram() {
        let collector = MetricsCollector::new().unwrap();
        collector.observe_quote_duration(Duration::from_millis(120));

        assert_eq!(collector.quotes().quote_duration_seconds.get_sample_count(), 1);
    }

    #[test]
    fn test_encode_text() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_quote_received();
        collector.record_email_sent();

        let text = collector.encode_text().unwrap();
        assert!(text.contains("quote_collection_quotes_received_total 1"));
        assert!(text.contains("quote_collection_emails_total{outcome=\"sent\"} 1"));
        assert!(text.contains("quote_collection_uptime_seconds"));
    }

    #[test]
    fn test_separate_registries() {
        // Two collectors must not clash on metric names
        let first = MetricsCollector::new().unwrap();
        let second = MetricsCollector::new().unwrap();
        first.record_quote_received();
        assert_eq!(second.quotes_received(), 0);
    }
}
