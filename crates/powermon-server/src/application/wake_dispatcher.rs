//! WakeDispatcher: repeatedly wakes every target until it reports back.
//!
//! The dispatcher owns the target map and is the only code that ever changes
//! it.  Its loop multiplexes two event sources:
//!
//! ```text
//!            ┌──────────────── ticker (every tick_interval) ──────────────┐
//!            │                                                            ▼
//! mpsc<VerificationEvent> ──► WakeDispatcher loop ──► magic packet per unverified target
//!                                  │
//!                                  ├─ all targets verified   ──► AllVerified
//!                                  └─ budget spent (no verify) ──► BudgetExhausted
//! ```
//!
//! # Two modes (for beginners)
//!
//! - **Verify off** (fire-and-forget): a machine that missed the first packet
//!   usually catches a later one, so the dispatcher sends `attempt_budget`
//!   rounds and stops.  Nothing ever reports back.
//! - **Verify on**: the dispatcher keeps sending to a target until that
//!   target reports it is online, then drops it from the rounds.  Once every
//!   target has reported the loop exits and the operator is notified.
//!
//! The first round goes out one tick after start, not immediately, giving the
//! network switch and DHCP time to come up after a power cut.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use powermon_core::notify::{notify_best_effort, Notifier};
use powermon_core::MacAddress;
use thiserror::Error;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use super::verification_tracker::VerificationTracker;

/// Notification sent when every target has verified.
pub const ALL_VERIFIED_MESSAGE: &str = "All clients are back online.";

/// Capacity of the verification event channel.
///
/// Kept at one so a request handler hands each event over almost directly,
/// waiting while the dispatcher is busy with a tick.
pub const EVENT_CHANNEL_CAPACITY: usize = 1;

/// Error type for sending one wake packet.
#[derive(Debug, Error)]
pub enum WakeSendError {
    /// No socket could be opened for sending.
    #[error("failed to open wake socket: {0}")]
    Socket(#[source] std::io::Error),
    /// The datagram could not be sent.
    #[error("failed to send wake packet to {target}: {source}")]
    Send {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

/// Sends one Wake-on-LAN packet.
#[cfg_attr(test, mockall::automock)]
pub trait WakePacketSender: Send + Sync {
    /// Sends a magic packet addressed to `mac`.
    ///
    /// # Errors
    ///
    /// Returns [`WakeSendError`]; the dispatcher logs it and relies on the
    /// next tick to try again.
    fn send_wake(&self, mac: &MacAddress) -> Result<(), WakeSendError>;
}

/// A report that a target is back online.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationEvent {
    pub mac: MacAddress,
    pub nickname: Option<String>,
}

/// Dispatcher timing and mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Must be non-zero.
    pub tick_interval: Duration,
    /// Rounds sent when `verify` is off, at least 1.
    pub attempt_budget: u32,
    pub verify: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(15),
            attempt_budget: 10,
            verify: false,
        }
    }
}

/// Why the dispatcher loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Verify mode with an empty target set; no tick was ever sent.
    NoTargets,
    /// Every target verified.
    AllVerified { sent_count: u32, verified_count: usize },
    /// Verify mode off and the attempt budget is spent.
    BudgetExhausted { sent_count: u32, verified_count: usize },
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    Continue,
    BudgetExhausted,
}

/// Result of one verification event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationResult {
    /// A pending target was marked verified; others are still pending.
    Verified,
    /// The last pending target was verified.
    AllVerified,
    /// Unknown or already verified address, or verify mode is off.
    Ignored,
}

/// Owner of the wake target map.
pub struct WakeDispatcher {
    /// Canonical address → verified.
    targets: BTreeMap<MacAddress, bool>,
    config: DispatchConfig,
    sender: Arc<dyn WakePacketSender>,
    notifier: Arc<dyn Notifier>,
    sent_count: u32,
    verified_count: usize,
}

impl WakeDispatcher {
    pub fn new(
        targets: impl IntoIterator<Item = MacAddress>,
        config: DispatchConfig,
        sender: Arc<dyn WakePacketSender>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            targets: targets.into_iter().map(|mac| (mac, false)).collect(),
            config,
            sender,
            notifier,
            sent_count: 0,
            verified_count: 0,
        }
    }

    pub fn sent_count(&self) -> u32 {
        self.sent_count
    }

    pub fn verified_count(&self) -> usize {
        self.verified_count
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn is_verified(&self, mac: &MacAddress) -> bool {
        self.targets.get(mac).copied().unwrap_or(false)
    }

    /// Sends one round of wake packets to every unverified target.
    pub fn on_tick(&mut self) -> TickResult {
        self.sent_count += 1;
        for (mac, _) in self.targets.iter().filter(|(_, verified)| !**verified) {
            match self.sender.send_wake(mac) {
                Ok(()) => info!("sent WOL packet to {mac}"),
                Err(e) => warn!("failed to send WOL to {mac}: {e}"),
            }
        }

        if !self.config.verify && self.sent_count >= self.config.attempt_budget {
            info!(
                "sent {} WOL rounds to each target, stopping WOL sender",
                self.sent_count
            );
            return TickResult::BudgetExhausted;
        }
        TickResult::Continue
    }

    /// Applies one verification event.
    pub fn on_verification(&mut self, event: VerificationEvent) -> VerificationResult {
        if !self.config.verify {
            debug!("verification for {} ignored: verify mode is off", event.mac);
            return VerificationResult::Ignored;
        }

        let nickname = event.nickname.unwrap_or_default();
        match self.targets.get_mut(&event.mac) {
            Some(verified) if !*verified => {
                *verified = true;
                self.verified_count += 1;
                info!("received verification from [{nickname}] mac {}", event.mac);
                notify_best_effort(
                    self.notifier.as_ref(),
                    &format!("Client [{nickname}] {} is verified back online.", event.mac),
                );
            }
            Some(_) => {
                debug!("{} already verified", event.mac);
                return VerificationResult::Ignored;
            }
            None => {
                debug!("verification for unknown address {} ignored", event.mac);
                return VerificationResult::Ignored;
            }
        }

        if self.verified_count == self.targets.len() {
            info!("received verification from all clients, stopped sending WOL packets");
            notify_best_effort(self.notifier.as_ref(), ALL_VERIFIED_MESSAGE);
            VerificationResult::AllVerified
        } else {
            VerificationResult::Verified
        }
    }

    /// Runs the dispatch loop until every target verified or the budget is
    /// spent.
    ///
    /// If `events` closes, the loop keeps ticking without it.
    pub async fn run(mut self, mut events: mpsc::Receiver<VerificationEvent>) -> DispatchOutcome {
        if self.config.verify && self.targets.is_empty() {
            info!("no wake targets to verify");
            return DispatchOutcome::NoTargets;
        }

        let period = self.config.tick_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut events_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.on_tick() == TickResult::BudgetExhausted {
                        return DispatchOutcome::BudgetExhausted {
                            sent_count: self.sent_count,
                            verified_count: self.verified_count,
                        };
                    }
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => {
                        if self.on_verification(event) == VerificationResult::AllVerified {
                            return DispatchOutcome::AllVerified {
                                sent_count: self.sent_count,
                                verified_count: self.verified_count,
                            };
                        }
                    }
                    None => {
                        debug!("verification feed closed");
                        events_open = false;
                    }
                },
            }
        }
    }

    /// Spawns the loop on its own task.
    ///
    /// The returned tracker feeds this dispatcher when verify mode is on and
    /// forwards nothing otherwise.
    pub fn spawn(self) -> (VerificationTracker, JoinHandle<DispatchOutcome>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let tracker = if self.config.verify {
            VerificationTracker::new(tx)
        } else {
            drop(tx);
            VerificationTracker::disabled()
        };
        let handle = tokio::spawn(async move {
            let outcome = self.run(rx).await;
            info!("wake dispatcher finished: {outcome:?}");
            outcome
        });
        (tracker, handle)
    }
}

/// Starts dispatching to `targets`.
///
/// With no targets nothing is spawned and the returned tracker is disabled.
pub fn start_dispatch(
    targets: impl IntoIterator<Item = MacAddress>,
    config: DispatchConfig,
    sender: Arc<dyn WakePacketSender>,
    notifier: Arc<dyn Notifier>,
) -> (VerificationTracker, Option<JoinHandle<DispatchOutcome>>) {
    let dispatcher = WakeDispatcher::new(targets, config, sender, notifier);
    if dispatcher.target_count() == 0 {
        info!("no wake targets configured");
        return (VerificationTracker::disabled(), None);
    }
    info!(
        "waking {} target(s) every {:?} (verify: {})",
        dispatcher.target_count(),
        config.tick_interval,
        config.verify
    );
    let (tracker, handle) = dispatcher.spawn();
    (tracker, Some(handle))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use powermon_core::notify::mock::RecordingNotifier;
    use std::sync::Mutex;

    const TICK: Duration = Duration::from_secs(15);

    fn mac(s: &str) -> MacAddress {
        s.parse().unwrap()
    }

    fn aa() -> MacAddress {
        mac("AA:AA:AA:AA:AA:AA")
    }

    fn bb() -> MacAddress {
        mac("BB:BB:BB:BB:BB:BB")
    }

    fn event(m: MacAddress) -> VerificationEvent {
        VerificationEvent {
            mac: m,
            nickname: Some("nas".into()),
        }
    }

    /// Records every packet with the paused-clock time it was sent at.
    struct RecordingSender {
        start: Instant,
        sent: Mutex<Vec<(MacAddress, Duration)>>,
    }

    impl RecordingSender {
        fn new() -> Self {
            Self {
                start: Instant::now(),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn count_for(&self, m: &MacAddress) -> usize {
            self.sent.lock().unwrap().iter().filter(|(x, _)| x == m).count()
        }
    }

    impl WakePacketSender for RecordingSender {
        fn send_wake(&self, mac: &MacAddress) -> Result<(), WakeSendError> {
            self.sent.lock().unwrap().push((*mac, self.start.elapsed()));
            Ok(())
        }
    }

    fn config(verify: bool) -> DispatchConfig {
        DispatchConfig {
            tick_interval: TICK,
            attempt_budget: 10,
            verify,
        }
    }

    fn dispatcher(
        targets: Vec<MacAddress>,
        verify: bool,
    ) -> (WakeDispatcher, Arc<RecordingSender>, Arc<RecordingNotifier>) {
        let sender = Arc::new(RecordingSender::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let d = WakeDispatcher::new(targets, config(verify), sender.clone(), notifier.clone());
        (d, sender, notifier)
    }

    // ── Event handling ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_tick_sends_only_to_unverified_targets() {
        // Arrange
        let (mut d, sender, _) = dispatcher(vec![aa(), bb()], true);
        d.on_verification(event(aa()));

        // Act
        let result = d.on_tick();

        // Assert
        assert_eq!(result, TickResult::Continue);
        assert_eq!(sender.count_for(&aa()), 0);
        assert_eq!(sender.count_for(&bb()), 1);
        assert_eq!(d.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_address_never_changes_verified_count() {
        let (mut d, _, notifier) = dispatcher(vec![aa()], true);

        let result = d.on_verification(event(mac("cc:cc:cc:cc:cc:cc")));

        assert_eq!(result, VerificationResult::Ignored);
        assert_eq!(d.verified_count(), 0);
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_verification_is_noop() {
        let (mut d, _, notifier) = dispatcher(vec![aa(), bb()], true);

        assert_eq!(d.on_verification(event(aa())), VerificationResult::Verified);
        assert_eq!(d.on_verification(event(aa())), VerificationResult::Ignored);

        assert_eq!(d.verified_count(), 1);
        assert_eq!(notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_last_verification_notifies_completion() {
        // Arrange
        let (mut d, _, notifier) = dispatcher(vec![aa()], true);

        // Act
        let result = d.on_verification(event(aa()));

        // Assert
        assert_eq!(result, VerificationResult::AllVerified);
        assert!(d.is_verified(&aa()));
        assert_eq!(
            notifier.messages(),
            vec![
                "Client [nas] aa:aa:aa:aa:aa:aa is verified back online.".to_string(),
                ALL_VERIFIED_MESSAGE.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_notifier_does_not_block_completion() {
        // Arrange
        let notifier = Arc::new(RecordingNotifier::failing());
        let mut d = WakeDispatcher::new(
            vec![aa()],
            config(true),
            Arc::new(RecordingSender::new()),
            notifier.clone(),
        );

        // Act
        let result = d.on_verification(event(aa()));

        // Assert: both notifications were attempted, state still advanced
        assert_eq!(result, VerificationResult::AllVerified);
        assert_eq!(notifier.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_verification_ignored_when_verify_off() {
        let (mut d, _, _) = dispatcher(vec![aa()], false);

        assert_eq!(d.on_verification(event(aa())), VerificationResult::Ignored);
        assert!(!d.is_verified(&aa()));
    }

    #[tokio::test]
    async fn test_send_failure_is_not_retried_inline() {
        // Arrange: the sender fails once per target per tick
        let mut sender = MockWakePacketSender::new();
        sender.expect_send_wake().times(1).returning(|_| {
            Err(WakeSendError::Socket(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            )))
        });
        let mut d = WakeDispatcher::new(
            vec![aa()],
            config(true),
            Arc::new(sender),
            Arc::new(RecordingNotifier::new()),
        );

        // Act
        let result = d.on_tick();

        // Assert
        assert_eq!(result, TickResult::Continue);
        assert_eq!(d.sent_count(), 1);
    }

    // ── Loop behaviour ────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_budget_runs_exactly_ten_ticks_without_verify() {
        // Arrange: verifications arrive but must be ignored
        let (d, sender, _) = dispatcher(vec![aa()], false);
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let start = Instant::now();
        let handle = tokio::spawn(d.run(rx));

        // Act
        tokio::time::sleep(Duration::from_secs(20)).await;
        tx.send(event(aa())).await.unwrap();
        let outcome = handle.await.unwrap();

        // Assert
        assert_eq!(
            outcome,
            DispatchOutcome::BudgetExhausted {
                sent_count: 10,
                verified_count: 0
            }
        );
        assert_eq!(sender.count_for(&aa()), 10);
        assert_eq!(start.elapsed(), TICK * 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_set_in_verify_mode_exits_without_ticking() {
        let (d, sender, _) = dispatcher(vec![], true);
        let (_tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let start = Instant::now();

        let outcome = d.run(rx).await;

        assert_eq!(outcome, DispatchOutcome::NoTargets);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_set_without_verify_still_terminates() {
        let (d, _, _) = dispatcher(vec![], false);
        let (_tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let outcome = d.run(rx).await;

        assert_eq!(
            outcome,
            DispatchOutcome::BudgetExhausted {
                sent_count: 10,
                verified_count: 0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_targets_verified_at_ticks_two_and_five() {
        // Arrange
        let (d, sender, notifier) = dispatcher(vec![aa(), bb()], true);
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let handle = tokio::spawn(d.run(rx));

        // Act: AA reports just after tick 2 (t=30), BB just after tick 5 (t=75)
        tokio::time::sleep(Duration::from_secs(31)).await;
        tx.send(event(aa())).await.unwrap();
        tokio::time::sleep(Duration::from_secs(45)).await;
        tx.send(event(bb())).await.unwrap();
        let outcome = handle.await.unwrap();

        // Assert
        assert_eq!(
            outcome,
            DispatchOutcome::AllVerified {
                sent_count: 5,
                verified_count: 2
            }
        );
        assert_eq!(sender.count_for(&aa()), 2);
        assert_eq!(sender.count_for(&bb()), 5);
        assert_eq!(notifier.messages().last().map(String::as_str), Some(ALL_VERIFIED_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_feed_keeps_ticking_until_budget() {
        let (d, sender, _) = dispatcher(vec![aa()], false);
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        drop(tx);

        let outcome = d.run(rx).await;

        assert!(matches!(outcome, DispatchOutcome::BudgetExhausted { .. }));
        assert_eq!(sender.count_for(&aa()), 10);
    }

    #[tokio::test]
    async fn test_start_dispatch_without_targets_spawns_nothing() {
        let (tracker, handle) = start_dispatch(
            Vec::new(),
            config(true),
            Arc::new(RecordingSender::new()),
            Arc::new(RecordingNotifier::new()),
        );

        assert!(handle.is_none());
        assert!(!tracker.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_dispatcher_is_fed_by_its_tracker() {
        // Arrange
        let sender = Arc::new(RecordingSender::new());
        let (tracker, handle) = start_dispatch(
            vec![aa()],
            config(true),
            sender.clone(),
            Arc::new(RecordingNotifier::new()),
        );

        // Act
        tokio::time::sleep(Duration::from_secs(16)).await;
        let delivered = tracker.forward(vec![aa()], None).await;
        let outcome = handle.unwrap().await.unwrap();

        // Assert
        assert_eq!(delivered, 1);
        assert_eq!(
            outcome,
            DispatchOutcome::AllVerified {
                sent_count: 1,
                verified_count: 1
            }
        );
        assert_eq!(sender.count_for(&aa()), 1);
    }

    #[test]
    fn test_default_config() {
        let c = DispatchConfig::default();
        assert_eq!(c.tick_interval, Duration::from_secs(15));
        assert_eq!(c.attempt_budget, 10);
        assert!(!c.verify);
    }
}
