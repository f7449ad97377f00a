use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// Transient user-facing message (the live view shows it for a few seconds).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notice>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) -> Notice {
        self.raise(NoticeLevel::Success, message.into())
    }

    pub fn info(&self, message: impl Into<String>) -> Notice {
        self.raise(NoticeLevel::Info, message.into())
    }

    pub fn error(&self, message: impl Into<String>) -> Notice {
        self.raise(NoticeLevel::Error, message.into())
    }

    fn raise(&self, level: NoticeLevel, message: String) -> Notice {
        match level {
            NoticeLevel::Error => warn!("notice: {message}"),
            _ => info!("notice: {message}"),
        }

        let notice = Notice {
            id: Uuid::new_v4(),
            level,
            message,
            raised_at: Utc::now(),
        };
        // No subscribers is fine; the log line above still records it.
        let _ = self.sender.send(notice.clone());
        notice
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(32)
    }
}
