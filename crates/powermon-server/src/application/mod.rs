//! Application layer for the server.
//!
//! - **`wake_dispatcher`** – Owns the wake targets; ticks and sends packets.
//! - **`verification_tracker`** – Turns inbound reports into dispatcher events.

pub mod verification_tracker;
pub mod wake_dispatcher;
