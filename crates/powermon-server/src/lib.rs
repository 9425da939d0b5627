//! powermon-server library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the `powermon` binary share the same module tree.
//!
//! # What does the server do? (for beginners)
//!
//! The server runs on a machine that powers up automatically when mains
//! power returns (BIOS "restore on AC power loss").  It has two jobs:
//!
//! 1. Answer `/status` probes, so clients running on battery can tell the
//!    power is back (or, by its silence, that it went away).
//! 2. Wake the machines that shut themselves down during the outage by
//!    broadcasting Wake-on-LAN magic packets every tick until they report
//!    back (`--verify`) or a fixed number of rounds has been sent.
//!
//! ```text
//! HTTP ingress ──► VerificationTracker ──(mpsc)──► WakeDispatcher ──► UDP broadcast
//! ```

/// Application layer: the wake dispatcher and its verification event feed.
pub mod application;

/// Infrastructure layer: UDP magic packet sender and the axum HTTP ingress.
pub mod infrastructure;
