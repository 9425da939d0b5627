//! powermon-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the `powermon` binary share the same module tree.
//!
//! # What does the client do? (for beginners)
//!
//! The client runs on a machine that stays up on battery power when the mains
//! fails.  It cannot see the power grid directly, so it watches a server that
//! *does* go down with the grid:
//!
//! 1. The **probe sender** hits `GET/POST /status` on the server every
//!    interval (and more often while probes are failing).
//! 2. The **timeout controller** arms a countdown when probes start failing
//!    and disarms it as soon as one succeeds.
//! 3. If the countdown runs out, the server has been unreachable for the
//!    whole window, so the client runs its terminal action: shutting the
//!    machine down before the battery is exhausted.

/// Application layer: the probe and timeout loops.
pub mod application;

/// Infrastructure layer: HTTP prober, OS shutdown, interface enumeration.
pub mod infrastructure;
