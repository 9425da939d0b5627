//! Infrastructure layer for the client.
//!
//! Contains the adapters behind the application layer's traits.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `powermon_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`http_probe`** – `reqwest` implementation of `Prober` (`POST /status`).
//! - **`verify_report`** – One-shot `POST /verify` report.
//! - **`shutdown`** – OS shutdown and custom command `ShutdownAction`s.
//! - **`hardware_addresses`** – Local interface hardware address enumeration.

pub mod hardware_addresses;
pub mod http_probe;
pub mod shutdown;
pub mod verify_report;
