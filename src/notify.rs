//! User notifications
//!
//! Controllers report outcomes through a [`Notifier`]. Delivery is
//! fire-and-forget: a notifier never fails back into the caller.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::{error, info, warn};

/// Notification severity, mirrored by how a front-end would color it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// One delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
}

/// Sink for user-facing messages
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity, duration: Duration);
}

/// Emits notifications as tracing events under the `nomina::notify` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity, duration: Duration) {
        let duration_ms = duration.as_millis() as u64;
        match severity {
            Severity::Error => error!(target: "nomina::notify", duration_ms, "{}", message),
            Severity::Warning => warn!(target: "nomina::notify", duration_ms, "{}", message),
            Severity::Success | Severity::Info => {
                info!(target: "nomina::notify", severity = severity.as_str(), duration_ms, "{}", message)
            }
        }
    }
}

/// Keeps every notification in memory for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.lock().last().cloned()
    }

    /// Remove and return everything delivered so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.delivered
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity, duration: Duration) {
        self.lock().push(Notification {
            message: message.to_string(),
            severity,
            duration,
        });
    }
}
