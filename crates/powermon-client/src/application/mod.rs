//! Application layer for the client.
//!
//! - **`probe_sender`** – Periodically probes the server through a
//!   [`probe_sender::Prober`] and emits one boolean outcome per probe.
//! - **`timeout_controller`** – Single-timer state machine that turns probe
//!   outcomes into (at most) one terminal [`timeout_controller::ShutdownAction`].
//! - **`liveness`** – Wires the two loops together with a channel.
//!
//! Nothing here talks to the network or the OS directly; both collaborators
//! are traits implemented in the infrastructure layer.

pub mod liveness;
pub mod probe_sender;
pub mod timeout_controller;
