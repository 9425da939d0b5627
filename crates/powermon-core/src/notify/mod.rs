//! Best-effort notifications.
//!
//! Both the client and the server announce important transitions (shutting
//! down, every target back online, …) through a [`Notifier`].  Notifications
//! are fire-and-forget: the protocol loops log a failed `send` and carry on,
//! they never retry it and never wait for delivery.
//!
//! # Implementations
//!
//! - [`pushover::PushoverNotifier`] – delivers to the Pushover API.
//! - [`NoopNotifier`] – used when no notification service is configured.
//! - [`mock::RecordingNotifier`] – records messages for tests.

pub mod mock;
pub mod pushover;

use thiserror::Error;

pub use pushover::{PushoverNotifier, PushoverSettings};

/// Error type for notification delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notifier was built without the settings it needs.
    #[error("notifier not configured: {0}")]
    NotConfigured(String),
    /// `send` was called outside a Tokio runtime, so delivery cannot be spawned.
    #[error("no async runtime available to deliver the notification")]
    NoRuntime,
    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Fire-and-forget notification sink.
pub trait Notifier: Send + Sync {
    /// Queues `message` for delivery.
    ///
    /// Returns once delivery has been *started*; transport failures after
    /// that point are logged by the implementation.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if delivery could not be started at all.
    fn send(&self, message: &str) -> Result<(), NotifyError>;
}

/// A notifier that discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn send(&self, message: &str) -> Result<(), NotifyError> {
        tracing::debug!("notification (not delivered): {message}");
        Ok(())
    }
}

/// Sends `message` and logs a failure instead of returning it.
///
/// This is the call the protocol loops use: notification errors must never
/// interrupt liveness or wake handling.
pub fn notify_best_effort(notifier: &dyn Notifier, message: &str) {
    if let Err(e) = notifier.send(message) {
        tracing::error!("notification failed: {e}");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::mock::RecordingNotifier;
    use super::*;

    #[test]
    fn test_noop_notifier_always_succeeds() {
        assert!(NoopNotifier.send("hello").is_ok());
    }

    #[test]
    fn test_notify_best_effort_swallows_errors() {
        // Arrange
        let notifier = RecordingNotifier::failing();

        // Act – must not panic or propagate
        notify_best_effort(&notifier, "boom");

        // Assert – the attempt is still recorded
        assert_eq!(notifier.messages(), vec!["boom".to_string()]);
    }
}
