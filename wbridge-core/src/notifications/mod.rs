//! Desktop notifications posted in response to wallet events.

mod text;

pub use text::{proposal_notification, transaction_notification};

use std::sync::Mutex;
use tracing::info;

/// Sink for desktop notifications.
///
/// Posting must not block for long; it runs inside a page's consumer loop.
pub trait DesktopNotifier: Send + Sync {
    fn notify(&self, message: &str);
    fn beep(&self);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl DesktopNotifier for TracingNotifier {
    fn notify(&self, message: &str) {
        info!(target: "desktop", message, "Desktop notification");
    }

    fn beep(&self) {
        info!(target: "desktop", "Beep");
    }
}

/// Notifier that keeps everything it was asked to post.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    beeps: Mutex<usize>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn beeps(&self) -> usize {
        self.beeps.lock().map(|beeps| *beeps).unwrap_or_default()
    }
}

impl DesktopNotifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_owned());
        }
    }

    fn beep(&self) {
        if let Ok(mut beeps) = self.beeps.lock() {
            *beeps += 1;
        }
    }
}
