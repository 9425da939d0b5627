//! Recording notifier for tests.
//!
//! Every call to `send` is pushed into a `Mutex<Vec<String>>` so assertions
//! can check exactly which notifications a loop produced and in what order.
//! Set `should_fail` to exercise the "notification failed" paths.

use std::sync::Mutex;

use super::{Notifier, NotifyError};

/// A notifier that records messages instead of delivering them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
    /// When `true`, `send` records the message and then returns an error.
    pub should_fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every `send` fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of the messages recorded so far.
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, message: &str) -> Result<(), NotifyError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.to_string());
        }
        if self.should_fail {
            return Err(NotifyError::NotConfigured("mock failure".into()));
        }
        Ok(())
    }
}
