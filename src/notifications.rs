use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::error::PreconditionError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Error,
    Info,
}

/// User-visible message: `message` is the headline, `description` the detail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn error(message: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            description: description.into(),
            kind: NotificationKind::Error,
            timestamp: Utc::now(),
        }
    }
}

impl From<PreconditionError> for Notification {
    fn from(err: PreconditionError) -> Self {
        Notification::error(err.title(), err.to_string())
    }
}

/// Fire-and-forget surface for user-facing messages
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

fn log_notification(notification: &Notification) {
    match notification.kind {
        NotificationKind::Error => {
            error!("🔔 {}: {}", notification.message, notification.description)
        }
        NotificationKind::Info => {
            info!("🔔 {}: {}", notification.message, notification.description)
        }
    }
}

/// Sink that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        log_notification(&notification);
    }
}

/// Broadcast channel capacity
const BROADCAST_CAPACITY: usize = 256;

/// Notification broadcaster
/// Fans notifications out to every connected panel client
pub struct NotificationBroadcaster {
    tx: broadcast::Sender<Notification>,
}

impl NotificationBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NotificationBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for NotificationBroadcaster {
    fn notify(&self, notification: Notification) {
        log_notification(&notification);
        // No subscribers is fine; the log line above is the fallback
        let delivered = self.tx.send(notification).unwrap_or(0);
        debug!("📡 Notification delivered to {} subscribers", delivered);
    }
}
