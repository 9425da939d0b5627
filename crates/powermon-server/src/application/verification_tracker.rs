//! VerificationTracker: bridges inbound reports into the dispatcher's feed.
//!
//! Request handlers run concurrently, one per connection, while the
//! dispatcher owns its target map alone.  The tracker is the only way a
//! handler can affect that map: it turns each reported address into one
//! [`VerificationEvent`] and sends it over the dispatcher's channel.
//!
//! Sends wait for channel capacity instead of failing, so a report that
//! arrives mid-tick is delayed, never dropped.

use powermon_core::MacAddress;
use tokio::sync::mpsc;
use tracing::debug;

use super::wake_dispatcher::VerificationEvent;

/// Cloneable handle shared by every request handler.
#[derive(Debug, Clone, Default)]
pub struct VerificationTracker {
    events: Option<mpsc::Sender<VerificationEvent>>,
}

impl VerificationTracker {
    pub fn new(events: mpsc::Sender<VerificationEvent>) -> Self {
        Self {
            events: Some(events),
        }
    }

    /// A tracker that forwards nothing (no dispatcher, or verify mode off).
    pub fn disabled() -> Self {
        Self { events: None }
    }

    /// `true` while a dispatcher is still consuming events.
    pub fn is_active(&self) -> bool {
        self.events.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Forwards each address, in order, as one event.
    ///
    /// Returns how many events were delivered.  Stops early once the
    /// dispatcher has exited.
    pub async fn forward(
        &self,
        macs: impl IntoIterator<Item = MacAddress>,
        nickname: Option<&str>,
    ) -> usize {
        let Some(tx) = &self.events else {
            return 0;
        };

        let mut delivered = 0;
        for mac in macs {
            let event = VerificationEvent {
                mac,
                nickname: nickname.map(str::to_string),
            };
            if tx.send(event).await.is_err() {
                debug!("wake dispatcher finished; verification for {mac} not forwarded");
                break;
            }
            delivered += 1;
        }
        delivered
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
