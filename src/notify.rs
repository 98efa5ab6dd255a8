// src/notify.rs
//! Transient user-facing notifications (the toast rail of the dashboard).
//! Pure delivery: notifications are fanned out over an unbounded channel
//! and mirrored to the log; nothing here holds state beyond the channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: Level,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Cloneable sender half; every component that needs to surface a toast
/// holds one of these.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, level: Level, message: impl Into<String>) {
        let notification = Notification::new(level, message);
        match notification.level {
            Level::Error => tracing::error!("🔔 {}", notification.message),
            Level::Warning => tracing::warn!("🔔 {}", notification.message),
            _ => tracing::info!("🔔 {}", notification.message),
        }
        // A dropped receiver just means no UI is listening; not an error.
        let _ = self.tx.send(notification);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(Level::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(Level::Error, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.notify(Level::Warning, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(Level::Info, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notifications_arrive_in_order_with_levels() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.success("Project deleted successfully");
        notifier.error("Failed to load projects");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.level, Level::Success);
        assert_eq!(first.message, "Project deleted successfully");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.level, Level::Error);
    }

    #[tokio::test]
    async fn dropped_receiver_is_tolerated() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.info("nobody listening");
    }
}
