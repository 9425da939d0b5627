//! Wires the probe sender and the timeout controller together.
//!
//! ```text
//! ProbeSender ──(mpsc, capacity 1: bool)──► TimeoutController ──► ShutdownAction
//!      ▲                                            │
//!      └──────────────── stop flag ◄────────────────┘
//! ```
//!
//! The channel has capacity 1 so the sender hands over each outcome almost
//! in lock-step with the controller, as an unbuffered channel would.

use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;

use powermon_core::notify::Notifier;
use tokio::sync::mpsc;
use tracing::info;

use super::probe_sender::{ProbeSchedule, ProbeSender, Prober};
use super::timeout_controller::{ControllerExit, ShutdownAction, TimeoutController};

/// Everything the two client loops need.
pub struct LivenessMonitor {
    pub prober: Arc<dyn Prober>,
    pub schedule: ProbeSchedule,
    pub timeout: Duration,
    pub shutdown: Arc<dyn ShutdownAction>,
    pub notifier: Arc<dyn Notifier>,
    /// Shared with the probe sender; set by the controller on expiry or by
    /// the caller (e.g. on Ctrl-C) to stop probing.
    pub stop: Arc<AtomicBool>,
}

impl LivenessMonitor {
    /// Spawns both loops and waits for the controller to finish.
    ///
    /// The probe sender is left to notice the stop flag on its own; it issues
    /// no further probes once the flag is set.
    pub async fn run(self) -> ControllerExit {
        let (tx, rx) = mpsc::channel(1);

        let sender = ProbeSender::new(self.prober, self.schedule, Arc::clone(&self.stop));
        tokio::spawn(sender.run(tx));

        let controller = TimeoutController::new(self.timeout, self.shutdown, self.notifier, self.stop);
        let exit = controller.run(rx).await;
        info!("timeout controller finished: {exit:?}");
        exit
    }
}
