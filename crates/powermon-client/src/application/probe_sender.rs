//! ProbeSender: the client's periodic liveness check.
//!
//! The sender runs one loop on its own Tokio task:
//!
//! ```text
//! ┌──────────────► stop flag set? ── yes ──► exit
//! │                     │ no
//! │                probe (bounded by the probe timeout)
//! │                     │
//! │           send outcome to the controller
//! │                     │
//! │       success ──► sleep(interval)
//! │       failure ──► sleep(retry_interval)
//! └─────────────────────┘
//! ```
//!
//! # Why a shorter retry interval? (for beginners)
//!
//! While the server is reachable one probe per interval is plenty.  Once a
//! probe fails the client probes much more often, so that the timeout
//! controller sees a dense stream of outcomes during an outage and a single
//! success (the server came back) disarms the countdown within a few seconds
//! instead of up to a full interval later.
//!
//! Cancellation is cooperative: the stop flag is read at the top of each
//! iteration, so it takes effect after the current probe and sleep finish.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::{sync::mpsc, time};
use tracing::{debug, info, warn};

/// Error type for a single failed probe.
///
/// Every variant counts as `success = false`; none of them is fatal.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The server could not be reached or did not answer in time.
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with something other than `200 OK`.
    #[error("non 200 status code received: {0}")]
    Status(u16),
    /// The prober could not be constructed.
    #[error("HTTP client error: {0}")]
    Setup(String),
}

/// One liveness check against the monitored server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prober: Send + Sync {
    /// Performs one probe.
    ///
    /// # Errors
    ///
    /// Any [`ProbeError`] means the server is considered unreachable for this
    /// probe.
    async fn probe(&self) -> Result<(), ProbeError>;
}

/// Timing of the probe loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSchedule {
    /// Pause after a successful probe.
    pub interval: Duration,
    /// Pause after a failed probe.
    pub retry_interval: Duration,
}

impl Default for ProbeSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            retry_interval: Duration::from_secs(3),
        }
    }
}

/// The periodic probe loop.
pub struct ProbeSender {
    prober: Arc<dyn Prober>,
    schedule: ProbeSchedule,
    stop: Arc<AtomicBool>,
}

impl ProbeSender {
    pub fn new(prober: Arc<dyn Prober>, schedule: ProbeSchedule, stop: Arc<AtomicBool>) -> Self {
        Self {
            prober,
            schedule,
            stop,
        }
    }

    /// Runs until the stop flag is set or the outcome receiver is dropped.
    pub async fn run(self, outcomes: mpsc::Sender<bool>) {
        loop {
            if self.stop.load(Ordering::Relaxed) {
                info!("probe sender stopped");
                break;
            }

            let success = match self.prober.probe().await {
                Ok(()) => {
                    debug!("probe succeeded");
                    true
                }
                Err(e) => {
                    warn!("error probing server: {e}");
                    false
                }
            };

            if outcomes.send(success).await.is_err() {
                debug!("timeout controller gone; probe sender exiting");
                break;
            }

            let pause = if success {
                self.schedule.interval
            } else {
                self.schedule.retry_interval
            };
            time::sleep(pause).await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
