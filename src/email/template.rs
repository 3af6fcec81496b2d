//! HTML rendering of quote notifications
//!
//! Everything here is total: any `QuoteRequest`, including an empty one,
//! produces a complete document and a subject line.

use crate::error::QuoteError;
use crate::types::QuoteRequest;
use crate::utils::{current_local_time, format_en_gb};
use askama::Template;
use chrono::{DateTime, Local};

/// Shown in place of any missing or falsy field
pub const PLACEHOLDER: &str = "N/A";

/// Team name printed under the header
pub const TEAM_NAME: &str = "Dream Cleaning Team";

/// Notification document for one quote
///
/// Values are interpolated as submitted, without HTML escaping.
#[derive(Debug, Template)]
#[template(path = "quote_email.html", escape = "none")]
pub struct QuoteEmailTemplate {
    pub team_name: &'static str,
    pub service_category: String,
    pub service_type: String,
    pub property_type: String,
    pub property_size: String,
    pub property_postcode: String,
    pub cleaning_timing: String,
    pub preferred_date: String,
    pub lead_name: String,
    pub lead_email: String,
    pub lead_email_href: String,
    pub lead_phone: String,
    pub lead_phone_href: String,
    pub received_at: String,
}

impl QuoteEmailTemplate {
    /// Fill the template from a quote, falling back to `N/A` per field
    pub fn new(quote: &QuoteRequest, received_at: &DateTime<Local>) -> Self {
        let shown = |field: &str| quote.field_or(field, PLACEHOLDER);
        // Link targets stay empty rather than pointing at the placeholder
        let href = |field: &str| quote.field(field).unwrap_or_default();

        Self {
            team_name: TEAM_NAME,
            service_category: shown("service_category"),
            service_type: shown("service_type"),
            property_type: shown("property_type"),
            property_size: shown("property_size"),
            property_postcode: shown("property_postcode"),
            cleaning_timing: shown("cleaning_timing"),
            preferred_date: shown("preferred_date"),
            lead_name: shown("lead_name"),
            lead_email: shown("lead_email"),
            lead_email_href: href("lead_email"),
            lead_phone: shown("lead_phone"),
            lead_phone_href: href("lead_phone"),
            received_at: format_received_at(received_at),
        }
    }

    /// Render, reporting template failures as an internal error
    pub fn render_html(&self) -> Result<String, QuoteError> {
        self.render().map_err(|e| QuoteError::Internal {
            message: format!("Failed to render quote email: {}", e),
        })
    }
}

/// Subject line of the notification
pub fn quote_subject(quote: &QuoteRequest) -> String {
    format!(
        "NEW LEAD: {} - {} in {}",
        quote.field_or("lead_name", "Unknown"),
        quote.field_or("service_category", "Service"),
        quote.field_or("property_postcode", "Unknown"),
    )
}

/// Timestamp printed in the footer
pub fn format_received_at(received_at: &DateTime<Local>) -> String {
    format_en_gb(received_at)
}

/// Render the notification stamped with the current time
pub fn render_quote_email_now(quote: &QuoteRequest) -> String {
    render_quote_email(quote, &current_local_time())
}

/// Render the notification document for a quote
///
/// Every template field is a plain `String`, so formatting cannot fail.
pub fn render_quote_email(quote: &QuoteRequest, received_at: &DateTime<Local>) -> String {
    QuoteEmailTemplate::new(quote, received_at).to_string()
}
