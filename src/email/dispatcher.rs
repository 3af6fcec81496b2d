//! Delivery of quote notifications to the admin inbox
//!
//! Two layers with different failure rules:
//! - rendering the document fails loudly, the caller gets an error;
//! - addressing and handing it to the SMTP relay never fails from the
//!   caller's point of view. A missing or malformed envelope address is
//!   treated like a relay rejection: logged, counted, then dropped.

use crate::config::AppConfig;
use crate::email::template::{quote_subject, QuoteEmailTemplate};
use crate::error::QuoteError;
use crate::metrics::MetricsCollector;
use crate::types::QuoteRequest;
use crate::utils::current_local_time;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::{debug, error, info};

/// A fully rendered notification, ready to hand to a transport
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    pub html: String,
}

impl OutgoingEmail {
    /// Build the MIME message for this email
    pub fn to_message(&self) -> Result<Message, QuoteError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(self.html.clone())
            .map_err(|e| QuoteError::Internal {
                message: format!("Failed to build message: {}", e),
            })
    }
}

/// Trait for anything that can deliver a rendered email
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one email
    async fn deliver(&self, email: &OutgoingEmail) -> Result<(), QuoteError>;
}

/// SMTP relay transport backed by lettre's pooled async client
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    relay: String,
}

impl SmtpMailTransport {
    /// Build the transport from configuration
    ///
    /// STARTTLS is used when the relay offers it but not required.
    /// Credentials are only attached when a username is configured.
    pub fn new(config: &AppConfig) -> Result<Self, QuoteError> {
        let smtp = &config.smtp;
        let tls = TlsParameters::new(smtp.host.clone()).map_err(|e| QuoteError::Configuration {
            message: format!("Invalid TLS parameters for {}: {}", smtp.host, e),
        })?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
            .port(smtp.port)
            .tls(Tls::Opportunistic(tls));

        if let Some(username) = &smtp.username {
            let password = smtp.password.clone().unwrap_or_default();
            builder = builder.credentials(Credentials::new(username.clone(), password));
        }

        if let Some(timeout) = config.smtp_timeout() {
            builder = builder.timeout(Some(timeout));
        }

        Ok(Self {
            transport: builder.build(),
            relay: format!("{}:{}", smtp.host, smtp.port),
        })
    }

    /// Relay this transport talks to, as `host:port`
    pub fn relay(&self) -> &str {
        &self.relay
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<(), QuoteError> {
        let message = email.to_message()?;

        debug!("Sending quote email via {}", self.relay);
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| QuoteError::Transport {
                message: e.to_string(),
            })?;

        debug!("SMTP relay answered with code {}", response.code());
        Ok(())
    }
}

/// Turns quote submissions into notification emails and dispatches them
pub struct QuoteMailer {
    transport: Arc<dyn MailTransport>,
    from_name: String,
    from_address: Option<String>,
    admin_email: Option<String>,
    metrics: Arc<MetricsCollector>,
}

impl QuoteMailer {
    /// Create a mailer over the given transport
    pub fn new(
        config: &AppConfig,
        transport: Arc<dyn MailTransport>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            transport,
            from_name: config.sender.from_name.clone(),
            from_address: config.from_address().map(str::to_string),
            admin_email: config.sender.admin_email.clone(),
            metrics,
        }
    }

    /// Configured recipient, if any
    pub fn admin_email(&self) -> Option<&str> {
        self.admin_email.as_deref()
    }

    /// Render the quote and address it to the admin inbox
    ///
    /// Rendering failures are `Internal`, address problems `Configuration`.
    pub fn compose(
        &self,
        quote: &QuoteRequest,
        received_at: &DateTime<Local>,
    ) -> Result<OutgoingEmail, QuoteError> {
        let html = QuoteEmailTemplate::new(quote, received_at).render_html()?;
        let from_address = parse_address("from", self.from_address.as_deref())?;
        let to_address = parse_address("admin", self.admin_email.as_deref())?;

        Ok(OutgoingEmail {
            from: Mailbox::new(Some(self.from_name.clone()), from_address),
            to: Mailbox::new(None, to_address),
            subject: quote_subject(quote),
            html,
        })
    }

    /// Compose and send the notification for one quote
    ///
    /// Returns an error only when the document cannot be rendered. Unusable
    /// addresses and failed deliveries are logged and reported as success.
    pub async fn send_quote(&self, quote: &QuoteRequest) -> Result<(), QuoteError> {
        let email = match self.compose(quote, &current_local_time()) {
            Ok(email) => email,
            Err(e @ QuoteError::Configuration { .. }) => {
                self.record_failure(&e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match self.transport.deliver(&email).await {
            Ok(()) => {
                self.metrics.record_email_sent();
                info!("✅ Email sent successfully to {}", email.to);
            }
            Err(e) => self.record_failure(&e),
        }

        Ok(())
    }

    fn record_failure(&self, e: &QuoteError) {
        // TODO: surface delivery failures to the caller or queue them for retry once the owners decide which
        self.metrics.record_email_failed();
        error!("❌ Email error: {}", e);
    }
}

fn parse_address(role: &str, raw: Option<&str>) -> Result<Address, QuoteError> {
    let raw = raw.ok_or_else(|| QuoteError::Configuration {
        message: format!("No {} address configured", role),
    })?;

    raw.parse::<Address>()
        .map_err(|e| QuoteError::Configuration {
            message: format!("Invalid {} address '{}': {}", role, raw, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use chrono::TimeZone;
    use serde_json::json;

    fn configured() -> AppConfig {
        let mut config = AppConfig::default();
        config.smtp.username = Some("bot@example.com".to_string());
        config.smtp.password = Some("secret".to_string());
        config.sender.admin_email = Some("admin@example.com".to_string());
        config
    }

    fn mailer_with(config: &AppConfig, transport: MockMailTransport) -> (QuoteMailer, Arc<MetricsCollector>) {
        let metrics = Arc::new(MetricsCollector::new().expect("Failed to create collector"));
        let mailer = QuoteMailer::new(config, Arc::new(transport), metrics.clone());
        (mailer, metrics)
    }

    fn sample_quote() -> QuoteRequest {
        QuoteRequest::from_value(json!({
            "lead_name": "J. Smith",
            "lead_email": "j@example.com",
            "service_category": "Deep Clean",
            "property_postcode": "SW1A"
        }))
    }

    #[test]
    fn test_compose_addresses_and_subject() {
        let (mailer, _) = mailer_with(&configured(), MockMailTransport::new());
        let at = Local.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();

        let email = mailer.compose(&sample_quote(), &at).unwrap();
        assert_eq!(email.subject, "NEW LEAD: J. Smith - Deep Clean in SW1A");
        assert_eq!(email.from.name.as_deref(), Some("Dream Cleaning Bot"));
        assert_eq!(email.from.email.to_string(), "bot@example.com");
        assert_eq!(email.to.email.to_string(), "admin@example.com");
        assert!(email.html.contains("Received: 19/10/2026, 09:00:00"));
    }

    #[test]
    fn test_compose_fails_without_admin_address() {
        let mut config = configured();
        config.sender.admin_email = None;
        let (mailer, _) = mailer_with(&config, MockMailTransport::new());

        let err = mailer.compose(&sample_quote(), &Local::now()).unwrap_err();
        assert!(matches!(err, QuoteError::Configuration { .. }));
    }

    #[test]
    fn test_compose_fails_on_malformed_address() {
        let mut config = configured();
        config.smtp.username = Some("not an address".to_string());
        let (mailer, _) = mailer_with(&config, MockMailTransport::new());

        assert!(mailer.compose(&QuoteRequest::new(), &Local::now()).is_err());
    }

    #[tokio::test]
    async fn test_send_quote_delivers_once() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_deliver()
            .withf(|email| email.subject == "NEW LEAD: J. Smith - Deep Clean in SW1A")
            .times(1)
            .returning(|_| Ok(()));
        let (mailer, metrics) = mailer_with(&configured(), transport);

        mailer.send_quote(&sample_quote()).await.unwrap();
        assert_eq!(metrics.emails_sent(), 1);
        assert_eq!(metrics.emails_failed(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_swallowed() {
        let mut transport = MockMailTransport::new();
        transport.expect_deliver().times(1).returning(|_| {
            Err(QuoteError::Transport {
                message: "535 authentication failed".to_string(),
            })
        });
        let (mailer, metrics) = mailer_with(&configured(), transport);

        assert!(mailer.send_quote(&sample_quote()).await.is_ok());
        assert_eq!(metrics.emails_failed(), 1);
        assert_eq!(metrics.emails_sent(), 0);
    }

    #[tokio::test]
    async fn test_missing_admin_address_is_swallowed() {
        let mut config = configured();
        config.sender.admin_email = None;
        let mut transport = MockMailTransport::new();
        transport.expect_deliver().never();
        let (mailer, metrics) = mailer_with(&config, transport);

        assert!(mailer.send_quote(&sample_quote()).await.is_ok());
        assert_eq!(metrics.emails_failed(), 1);
        assert_eq!(metrics.emails_sent(), 0);
    }

    #[tokio::test]
    async fn test_bare_username_sender_is_swallowed() {
        let mut config = configured();
        config.smtp.username = Some("apikey".to_string());
        config.sender.from_address = None;
        let mut transport = MockMailTransport::new();
        transport.expect_deliver().never();
        let (mailer, metrics) = mailer_with(&config, transport);

        assert!(mailer.send_quote(&sample_quote()).await.is_ok());
        assert_eq!(metrics.emails_failed(), 1);
    }

    #[test]
    fn test_to_message_is_html() {
        let (mailer, _) = mailer_with(&configured(), MockMailTransport::new());
        let email = mailer.compose(&sample_quote(), &Local::now()).unwrap();
        let message = email.to_message().unwrap();

        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("Content-Type: text/html; charset=utf-8"));
        assert!(formatted.contains("Subject: NEW LEAD: J. Smith - Deep Clean in SW1A"));
    }

    #[tokio::test]
    async fn test_smtp_transport_builds_from_config() {
        let mut config = configured();
        config.smtp.host = "localhost".to_string();
        config.smtp.port = 2525;
        config.smtp.timeout_seconds = Some(5);

        let transport = SmtpMailTransport::new(&config).unwrap();
        assert_eq!(transport.relay(), "localhost:2525");
    }
}
