//! Test fixtures: a recording mail transport and a throwaway SMTP server

#![allow(dead_code)]

use async_trait::async_trait;
use quote_collection::config::AppConfig;
use quote_collection::email::{MailTransport, OutgoingEmail};
use quote_collection::error::QuoteError;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Mail transport that keeps every email it is asked to deliver
#[derive(Debug, Default)]
pub struct RecordingTransport {
    delivered: Arc<Mutex<Vec<OutgoingEmail>>>,
    fail_with: Option<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every delivery fails with the given message
    pub fn failing(message: &str) -> Self {
        Self {
            delivered: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(message.to_string()),
        }
    }

    /// All emails handed to this transport (failed ones included)
    pub fn delivered(&self) -> Vec<OutgoingEmail> {
        self.delivered
            .lock()
            .map(|emails| emails.clone())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.delivered().len()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<(), QuoteError> {
        if let Ok(mut emails) = self.delivered.lock() {
            emails.push(email.clone());
        }
        match &self.fail_with {
            Some(message) => Err(QuoteError::Transport {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Configuration with every mail setting filled in
pub fn mail_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.smtp.username = Some("bot@example.com".to_string());
    config.smtp.password = Some("secret".to_string());
    config.sender.admin_email = Some("admin@example.com".to_string());
    config
}

/// One message as seen by the SMTP sink
#[derive(Debug, Clone, Default)]
pub struct CapturedMail {
    pub from: String,
    pub to: Vec<String>,
    pub data: String,
}

/// Start a minimal SMTP server on localhost that accepts everything
///
/// It advertises neither STARTTLS nor AUTH, so clients must be configured
/// without credentials.
pub async fn spawn_smtp_sink() -> (SocketAddr, mpsc::UnboundedReceiver<CapturedMail>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind SMTP sink");
    let addr = listener.local_addr().expect("SMTP sink has no address");
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(smtp_session(stream, tx.clone()));
        }
    });

    (addr, rx)
}

async fn smtp_session(stream: TcpStream, tx: mpsc::UnboundedSender<CapturedMail>) {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    let mut mail = CapturedMail::default();

    if write.write_all(b"220 localhost ESMTP sink\r\n").await.is_err() {
        return;
    }

    while let Ok(Some(line)) = lines.next_line().await {
        let upper = line.to_ascii_uppercase();
        let reply: &[u8] = if upper.starts_with("EHLO") || upper.starts_with("HELO") {
            b"250 localhost\r\n"
        } else if upper.starts_with("MAIL FROM:") {
            mail.from = strip_path(&line["MAIL FROM:".len()..]);
            b"250 OK\r\n"
        } else if upper.starts_with("RCPT TO:") {
            mail.to.push(strip_path(&line["RCPT TO:".len()..]));
            b"250 OK\r\n"
        } else if upper == "DATA" {
            if write.write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n").await.is_err() {
                return;
            }
            let mut data = Vec::new();
            while let Ok(Some(data_line)) = lines.next_line().await {
                if data_line == "." {
                    break;
                }
                data.push(data_line);
            }
            mail.data = data.join("\n");
            let _ = tx.send(std::mem::take(&mut mail));
            b"250 OK queued\r\n"
        } else if upper == "QUIT" {
            let _ = write.write_all(b"221 Bye\r\n").await;
            return;
        } else {
            b"250 OK\r\n"
        };

        if write.write_all(reply).await.is_err() {
            return;
        }
    }
}

fn strip_path(raw: &str) -> String {
    let raw = raw.trim();
    let end = raw.find('>').map(|i| i + 1).unwrap_or(raw.len());
    raw[..end]
        .trim_start_matches('<')
        .trim_end_matches('>')
        .to_string()
}

/// A localhost port with nothing listening on it
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let port = listener
        .local_addr()
        .expect("Probe listener has no address")
        .port();
    drop(listener);
    port
}
