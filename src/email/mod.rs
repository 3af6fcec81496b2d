//! Quote notification emails
//!
//! Rendering is pure and lives in `template`; delivery over SMTP lives in
//! `dispatcher`.

pub mod dispatcher;
pub mod template;

pub use dispatcher::{MailTransport, OutgoingEmail, QuoteMailer, SmtpMailTransport};
pub use template::{
    quote_subject, render_quote_email, render_quote_email_now, QuoteEmailTemplate, PLACEHOLDER,
};
