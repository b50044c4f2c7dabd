//! Best-effort local notifications
//!
//! The synchronizer raises a notification when a poll discovers newly
//! assigned tasks. Delivery is entirely optional: a failure is logged
//! and never propagates to the caller or halts polling.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Notification error type
///
/// Always swallowed by callers; exists so implementations can report
/// why delivery failed in logs.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The platform refused or dropped the notification
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Notification sink
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one notification with a title and a one-line body
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Notifier that writes through the tracing subscriber
///
/// The default sink for headless runs; the CLI swaps in a terminal
/// printer for `watch` mode.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates a new log notifier
    pub fn new() -> Self {
        LogNotifier
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!(%title, %body, "Notification");
        Ok(())
    }
}

/// Notifier that records deliveries for assertions
///
/// Test double; can also be made to fail on demand to exercise the
/// best-effort path.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    /// Creates an empty recorder
    pub fn new() -> Self {
        RecordingNotifier::default()
    }

    /// Makes every delivery fail until cleared
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Everything delivered so far, as (title, body) pairs
    pub async fn delivered(&self) -> Vec<(String, String)> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("injected failure".to_string()));
        }
        self.delivered
            .lock()
            .await
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}
