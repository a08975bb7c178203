// User-visible notifications (the UI's snack bar)
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SnackType {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    pub level: SnackType,
    /// How long the UI keeps it on screen; `None` means until dismissed.
    pub duration: Option<Duration>,
    pub at: DateTime<Utc>,
}

/// Where notifications go. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, level: SnackType, duration: Option<Duration>);
}

/// Writes notifications through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, level: SnackType, _duration: Option<Duration>) {
        match level {
            SnackType::Info | SnackType::Success => log::info!("notify: {message}"),
            SnackType::Warning => log::warn!("notify: {message}"),
            SnackType::Error => log::error!("notify: {message}"),
        }
    }
}

/// Forwards notifications to a channel the UI drains.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: &str, level: SnackType, duration: Option<Duration>) {
        let notification = Notification {
            message: message.to_string(),
            level,
            duration,
            at: Utc::now(),
        };
        if self.tx.send(notification).is_err() {
            log::debug!("notify: receiver gone, dropping {level:?} \"{message}\"");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_notifier_delivers_in_order() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier.notify("first", SnackType::Info, None);
        notifier.notify("second", SnackType::Success, Some(Duration::from_secs(4)));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.message, "first");
        assert_eq!(first.level, SnackType::Info);
        assert_eq!(first.duration, None);

        let second = rx.try_recv().unwrap();
        assert_eq!(second.level, SnackType::Success);
        assert_eq!(second.duration, Some(Duration::from_secs(4)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_notifier_survives_closed_receiver() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.notify("nobody listening", SnackType::Error, None);
    }
}
