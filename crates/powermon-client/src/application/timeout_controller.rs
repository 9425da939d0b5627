//! TimeoutController: arms and disarms the shutdown countdown.
//!
//! # State machine
//!
//! ```text
//!                 success
//!   ┌──────────┐ ────────► ┌────────────┐
//!   │  Armed   │           │  Disarmed  │
//!   │(deadline)│ ◄──────── │            │
//!   └──────────┘  failure  └────────────┘
//!        │         (deadline = now + timeout)
//!        │ deadline reached
//!        ▼
//!   terminal action (once), stop the probe sender, exit
//! ```
//!
//! - The controller starts **armed** with `deadline = start + timeout`: until
//!   the first probe succeeds it assumes the server may already be down.
//! - A failure while armed does *not* move the deadline, and a success while
//!   disarmed changes nothing.  Only a failure that follows a success re-arms
//!   the countdown, so the terminal action fires after a *continuous* failure
//!   window of exactly `timeout`.
//!
//! # Single writer
//!
//! [`TimeoutState`] lives inside the controller and is only touched by its own
//! loop.  Probe outcomes arrive over an `mpsc` channel; nothing else can read
//! or change the state.
//!
//! # Stale expiries
//!
//! The countdown is one `tokio::time::Sleep`.  Disarming stops polling it, and
//! re-arming resets it to the new deadline, so an expiry that elapsed while
//! disarmed is discarded instead of firing later.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use powermon_core::notify::{notify_best_effort, Notifier};
use thiserror::Error;
use tokio::{
    sync::mpsc,
    time::{self, Instant},
};
use tracing::{debug, error, info, warn};

/// Notification sent when the terminal action runs.
pub const TIMEOUT_MESSAGE: &str = "Timeout reached, shutting down.";

/// Error type for the terminal action.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// The command could not be started.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// The command ran but reported failure.
    #[error("'{command}' exited with {status}")]
    Failed { command: String, status: String },
}

/// The OS-level action taken when the server stays unreachable.
#[cfg_attr(test, mockall::automock)]
pub trait ShutdownAction: Send + Sync {
    /// Performs the action.  Called at most once per process.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] if the action could not be carried out.
    fn shutdown(&self) -> Result<(), ShutdownError>;
}

/// Countdown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutState {
    /// No countdown running; the server answered recently.
    Disarmed,
    /// Countdown running; the terminal action fires at `deadline`.
    Armed { deadline: Instant },
}

/// What a probe outcome did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Armed,
    Disarmed,
    Unchanged,
}

/// Why the controller loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerExit {
    /// The deadline was reached and the terminal action ran.
    TimedOut,
    /// The probe sender went away while the countdown was disarmed.
    ProbesClosed,
}

/// The client's single-timer state machine.
pub struct TimeoutController {
    timeout: Duration,
    state: TimeoutState,
    shutdown: Arc<dyn ShutdownAction>,
    notifier: Arc<dyn Notifier>,
    stop: Arc<AtomicBool>,
}

impl TimeoutController {
    /// Creates a controller, armed with `deadline = now + timeout`.
    ///
    /// `stop` is the probe sender's stop flag; it is set when the terminal
    /// action fires.
    pub fn new(
        timeout: Duration,
        shutdown: Arc<dyn ShutdownAction>,
        notifier: Arc<dyn Notifier>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            timeout,
            state: TimeoutState::Armed {
                deadline: Instant::now() + timeout,
            },
            shutdown,
            notifier,
            stop,
        }
    }

    pub fn state(&self) -> TimeoutState {
        self.state
    }

    /// Applies one probe outcome observed at `now`.
    pub fn on_probe_result(&mut self, success: bool, now: Instant) -> Transition {
        match (self.state, success) {
            (TimeoutState::Armed { .. }, true) => {
                self.state = TimeoutState::Disarmed;
                info!("probe succeeded, stopping timeout");
                Transition::Disarmed
            }
            (TimeoutState::Disarmed, false) => {
                self.state = TimeoutState::Armed {
                    deadline: now + self.timeout,
                };
                warn!("probe failed, shutting down in {:?} unless the server returns", self.timeout);
                Transition::Armed
            }
            _ => Transition::Unchanged,
        }
    }

    /// Runs the controller until the terminal action fires or the probe
    /// sender goes away while disarmed.
    pub async fn run(mut self, mut outcomes: mpsc::Receiver<bool>) -> ControllerExit {
        let initial = match self.state {
            TimeoutState::Armed { deadline } => deadline,
            TimeoutState::Disarmed => Instant::now() + self.timeout,
        };
        let countdown = time::sleep_until(initial);
        tokio::pin!(countdown);

        loop {
            let armed = matches!(self.state, TimeoutState::Armed { .. });

            tokio::select! {
                // An outcome already queued when the deadline elapses is
                // applied first: a success at that instant cancels the countdown.
                biased;

                outcome = outcomes.recv() => match outcome {
                    Some(success) => {
                        if self.on_probe_result(success, Instant::now()) == Transition::Armed {
                            if let TimeoutState::Armed { deadline } = self.state {
                                countdown.as_mut().reset(deadline);
                            }
                        }
                    }
                    None if armed => {
                        debug!("probe sender gone; waiting out the armed countdown");
                        (&mut countdown).await;
                        self.fire().await;
                        return ControllerExit::TimedOut;
                    }
                    None => {
                        info!("probe sender gone; timeout controller exiting");
                        return ControllerExit::ProbesClosed;
                    }
                },

                () = &mut countdown, if armed => {
                    self.fire().await;
                    return ControllerExit::TimedOut;
                }
            }
        }
    }

    /// Terminal transition: stop probing, notify, run the action once.
    async fn fire(&self) {
        self.stop.store(true, Ordering::Relaxed);
        warn!("{TIMEOUT_MESSAGE}");
        notify_best_effort(self.notifier.as_ref(), TIMEOUT_MESSAGE);

        let action = Arc::clone(&self.shutdown);
        match tokio::task::spawn_blocking(move || action.shutdown()).await {
            Ok(Ok(())) => info!("shutdown action completed"),
            Ok(Err(e)) => error!("error executing shutdown action: {e}"),
            Err(e) => error!("shutdown action task failed: {e}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
