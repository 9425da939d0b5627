//! # powermon-core
//!
//! Shared library for powermon containing the domain types, the probe wire
//! protocol, the notification collaborator, logging setup and the TOML
//! configuration schema.
//!
//! This crate is used by both the client and the server.
//!
//! # Architecture overview (for beginners)
//!
//! powermon watches for power outages.  A *server* runs on a machine that
//! goes down when the mains power fails (for example a desktop without a UPS).
//! *Clients* run on machines kept alive by a UPS; they probe the server
//! periodically, and when the server has been silent for long enough they
//! shut themselves down cleanly before the UPS battery runs out.
//!
//! When power returns, the server boots, sends Wake-on-LAN magic packets to
//! the clients and keeps doing so until every client reports back that it is
//! online again.
//!
//! This crate defines:
//!
//! - **`domain`** – Hardware addresses, probe endpoints, client identity and
//!   the wake list file format.  No I/O except the endpoint's DNS check.
//!
//! - **`protocol`** – The HTTP probe / verify payloads and the Wake-on-LAN
//!   magic packet encoding.
//!
//! - **`notify`** – The `Notifier` collaborator and its Pushover transport.
//!
//! - **`logging`** and **`config`** – Process-wide ambient setup shared by the
//!   `powermon` binary.

pub mod config;
pub mod domain;
pub mod logging;
pub mod notify;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `powermon_core::MacAddress` instead of `powermon_core::domain::mac::MacAddress`.
pub use domain::endpoint::{EndpointError, ProbeEndpoint, Scheme};
pub use domain::identity::ClientIdentity;
pub use domain::mac::{MacAddress, MacParseError};
pub use domain::wake_list::{build_target_set, load_wake_list, parse_wake_list, WakeListError};
pub use notify::{Notifier, NotifyError};
pub use protocol::magic_packet::MagicPacket;
pub use protocol::messages::StatusReport;
