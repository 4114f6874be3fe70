//! Fire-and-forget user notifications.
//!
//! Components report outcomes through a [`Notifier`] instead of returning
//! errors to their caller. Nothing is acknowledged.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind: NotificationKind::Info,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind: NotificationKind::Destructive,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Emits notifications as log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Info => {
                tracing::info!(title = %notification.title, "{}", notification.description)
            }
            NotificationKind::Destructive => {
                tracing::error!(title = %notification.title, "{}", notification.description)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind() {
        let ok = Notification::info("Saved", "report.pdf");
        assert_eq!(ok.kind, NotificationKind::Info);
        assert_eq!(ok.title, "Saved");

        let failed = Notification::destructive("Export failed", "try again");
        assert_eq!(failed.kind, NotificationKind::Destructive);

        // no subscriber installed; must not panic
        TracingNotifier.notify(failed);
    }
}
