// Push notifications to the chat front end's external message endpoint

use anyhow::{anyhow, bail, Result};
use chrono::Local;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::NotificationsConfig;

const MESSAGE_PATH: &str = "/api/external-message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "success" => Ok(Severity::Success),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => bail!("Unknown severity '{}', expected info, success, warning or error", other),
        }
    }
}

/// Wire payload of one message.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub message: String,
    pub sender: String,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub timestamp: String,
}

impl Notification {
    pub fn new(message: impl Into<String>, sender: impl Into<String>, severity: Severity) -> Self {
        Notification {
            message: message.into(),
            sender: sender.into(),
            severity,
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        }
    }
}

/// Fire-and-forget delivery. Implementations must not block the caller on
/// the network and must swallow their own failures.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, sender: &str, severity: Severity);

    /// Wait for deliveries still in flight. Short-lived processes call this
    /// before exiting.
    fn flush(&self) {}
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, message: &str, sender: &str, severity: Severity) {
        info!(%sender, %severity, "{}", message);
    }
}

/// Posts notifications as JSON to `<endpoint>/api/external-message`.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    url: String,
    timeout: Duration,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl HttpNotifier {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        HttpNotifier {
            url: format!("{}{}", endpoint.trim_end_matches('/'), MESSAGE_PATH),
            timeout,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver one notification and wait for the response.
    pub fn send_blocking(&self, notification: &Notification) -> Result<()> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| anyhow!("failed to build http client: {e}"))?;

        let resp = client
            .post(&self.url)
            .json(notification)
            .send()
            .map_err(|e| anyhow!("failed to reach message service at {} ({e})", self.url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().unwrap_or_default();
            bail!("message service http error {status}: {text}");
        }
        debug!(url = %self.url, "notification delivered");
        Ok(())
    }
}

impl NotificationSink for HttpNotifier {
    fn notify(&self, message: &str, sender: &str, severity: Severity) {
        let notifier = self.clone();
        let notification = Notification::new(message, sender, severity);
        let handle = std::thread::spawn(move || {
            if let Err(e) = notifier.send_blocking(&notification) {
                warn!(error = %e, "notification push failed");
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Each delivery is bounded by the client timeout.
    fn flush(&self) {
        let handles: Vec<_> = self.pending.lock().unwrap_or_else(|e| e.into_inner()).drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                warn!("notification thread panicked");
            }
        }
    }
}

/// HTTP delivery when an endpoint is configured, log-only otherwise.
pub fn from_config(config: &NotificationsConfig) -> Box<dyn NotificationSink> {
    match config.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
        Some(endpoint) => Box::new(HttpNotifier::new(endpoint, Duration::from_secs(config.timeout_secs))),
        None => Box::new(LogNotifier),
    }
}
