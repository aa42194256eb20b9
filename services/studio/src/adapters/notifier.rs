//! services/studio/src/adapters/notifier.rs
//!
//! Toasts become log lines under the `toast` target.

use kidsmart_core::ports::{Notification, NotificationKind, Notifier};
use tracing::{info, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => info!(target: "toast", "{}", notification.message),
            NotificationKind::Error => warn!(target: "toast", "{}", notification.message),
        }
    }
}
