//! Background notification delivery.
//!
//! The worker drains a bus subscription on its own thread and hands each
//! event to a [`Notifier`]. Delivery is best-effort: a failed notification
//! is logged and dropped, never retried against the workflow that produced
//! it.

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::bus::Subscription;
use crate::notification::NotificationEvent;

/// Delivery failure reported by a notifier backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Outbound delivery boundary (SMTP, webhook, ...; out of scope here).
pub trait Notifier: Send + Sync {
    fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        (**self).notify(recipient, subject, body)
    }
}

/// Notifier that only logs. Useful when embedding without a real backend.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, recipient: &str, subject: &str, _body: &str) -> Result<(), NotifyError> {
        info!(recipient, subject, "notification");
        Ok(())
    }
}

/// Test double that records every delivery.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push((
            recipient.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

/// Handle to a running delivery worker.
#[derive(Debug)]
pub struct NotificationWorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl NotificationWorkerHandle {
    /// Request graceful shutdown and wait for the thread to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Notification delivery worker.
#[derive(Debug, Clone)]
pub struct NotificationWorker {
    /// How long to block on the subscription before checking for shutdown.
    pub poll_interval: Duration,
    /// Recipient used when the order carried no address.
    pub fallback_recipient: String,
}

impl Default for NotificationWorker {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            fallback_recipient: "warehouse-admin@localhost".to_string(),
        }
    }
}

impl NotificationWorker {
    pub fn with_fallback_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.fallback_recipient = recipient.into();
        self
    }

    /// Spawn the delivery thread over a bus subscription.
    pub fn spawn<N>(
        self,
        subscription: Subscription<NotificationEvent>,
        notifier: N,
    ) -> NotificationWorkerHandle
    where
        N: Notifier + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                match subscription.recv_timeout(self.poll_interval) {
                    Ok(event) => deliver(&notifier, &self.fallback_recipient, &event),
                    Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        NotificationWorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

fn deliver<N: Notifier>(notifier: &N, fallback: &str, event: &NotificationEvent) {
    let recipient = event.recipient().unwrap_or(fallback);
    let subject = event.subject();

    if let Err(e) = notifier.notify(recipient, &subject, &event.body()) {
        // Swallowed: a failed notification must never surface to the
        // workflow caller or undo a committed transition.
        warn!(recipient, subject, error = %e, "notification delivery failed");
    }
}
