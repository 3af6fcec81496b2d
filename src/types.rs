//! Common types used throughout the quote collection service

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Service name reported by the health probe
pub const SERVICE_NAME: &str = "quote-collection";

/// Fields the notification email knows how to render
pub const RECOGNIZED_FIELDS: [&str; 10] = [
    "service_category",
    "service_type",
    "property_type",
    "property_size",
    "property_postcode",
    "cleaning_timing",
    "preferred_date",
    "lead_name",
    "lead_email",
    "lead_phone",
];

/// A quote submission as posted by the website form
///
/// Nothing is required and nothing is type checked: every field is looked up
/// on demand and defaulted independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteRequest {
    fields: Map<String, Value>,
}

impl QuoteRequest {
    /// Create an empty quote
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a quote from any JSON value
    ///
    /// Objects are taken as-is; every other shape yields an empty quote.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    /// Set a field, returning the updated quote
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Text of a field, or `None` when it is missing or falsy
    ///
    /// Falsy means `null`, `false`, `0` or the empty string.
    pub fn field(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::Null => None,
            Value::Bool(false) => None,
            Value::Bool(true) => Some("true".to_string()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Text of a field, or `fallback` when it is missing or falsy
    pub fn field_or(&self, name: &str, fallback: &str) -> String {
        self.field(name).unwrap_or_else(|| fallback.to_string())
    }

    /// Number of keys submitted, recognized or not
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Keys that the email template does not render
    pub fn unrecognized_keys(&self) -> Vec<&str> {
        self.fields
            .keys()
            .map(String::as_str)
            .filter(|key| !RECOGNIZED_FIELDS.contains(key))
            .collect()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for QuoteRequest {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Acknowledgment returned by the quote endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QuoteResponse {
    /// The quote was accepted (which says nothing about delivery)
    pub fn received() -> Self {
        Self {
            success: true,
            message: Some("Quote received successfully".to_string()),
            error: None,
        }
    }

    /// Generic failure; details stay in the logs
    pub fn failed() -> Self {
        Self::error("Failed to process quote")
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(message.into()),
        }
    }
}

/// Payload of the liveness probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
        }
    }
}
