//! Utility functions for the quote collection service

use chrono::{DateTime, Local};
use uuid::Uuid;

/// Generate an id to correlate the log lines of one submission
pub fn generate_receipt_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current local timestamp
pub fn current_local_time() -> DateTime<Local> {
    Local::now()
}

/// Format a timestamp the way en-GB locales print date and time
///
/// e.g. `19/10/2026, 14:03:05`
pub fn format_en_gb(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%d/%m/%Y, %H:%M:%S").to_string()
}
