use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A transient user-facing message (rendered as a toast by the UI)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Fan-out of notices to whoever renders them
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notice>,
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Error, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Info, message.into());
    }

    fn send(&self, level: NoticeLevel, message: String) {
        // Ignore errors if no receivers
        let _ = self.sender.send(Notice { level, message });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_notices() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.success("Block added");
        notifier.error("Failed to save block");

        assert_eq!(rx.recv().await.unwrap().level, NoticeLevel::Success);
        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Failed to save block");
    }

    #[test]
    fn test_send_without_subscribers() {
        Notifier::new().info("nobody listening");
    }
}
