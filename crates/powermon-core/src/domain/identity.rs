//! Client identity: who a client says it is when it probes the server.

use std::collections::BTreeSet;

use crate::domain::mac::MacAddress;
use crate::protocol::messages::StatusReport;

/// Nickname plus the hardware addresses of every local interface.
///
/// Collected once at client startup and immutable for the life of the
/// process.  When verification is enabled it is attached to every probe so a
/// server that is still sending wake packets can tell which targets are back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientIdentity {
    nickname: String,
    hardware_addresses: BTreeSet<MacAddress>,
}

impl ClientIdentity {
    pub fn new(
        nickname: impl Into<String>,
        hardware_addresses: impl IntoIterator<Item = MacAddress>,
    ) -> Self {
        Self {
            nickname: nickname.into(),
            hardware_addresses: hardware_addresses.into_iter().collect(),
        }
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Hardware addresses in canonical order, without duplicates.
    pub fn hardware_addresses(&self) -> impl Iterator<Item = &MacAddress> {
        self.hardware_addresses.iter()
    }

    /// Builds the JSON document sent in the body of `POST /status`.
    pub fn to_report(&self) -> StatusReport {
        StatusReport {
            macs: self
                .hardware_addresses
                .iter()
                .map(ToString::to_string)
                .collect(),
            nickname: self.nickname.clone(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
